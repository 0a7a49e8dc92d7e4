pub mod config_cmd;
pub mod list;
pub mod mark;
pub mod mark_all;
pub mod move_cmd;
pub mod reset;

use crate::args::DocumentArgs;
use crate::collector::Collector;
use crate::config::Config;
use crate::document::{MarkdownFile, print_contents};
use crate::output::print_warning;

/// Build the settings context for one invocation.
///
/// Configuration errors are reported here, once, and the affected matcher
/// falls back to its lenient default.
pub fn build_collector(config: &Config) -> Collector {
    let (collector, errors) = Collector::new(config.tasks.clone());
    for err in errors {
        print_warning(&err.to_string());
    }
    collector
}

/// Write the document back after an edit.
///
/// Files are only rewritten when their text changed. Stdin documents are
/// always echoed so the command works as a filter. With `--dry-run` the result
/// is printed and nothing is saved.
pub fn finish(doc: &MarkdownFile, args: &DocumentArgs) -> Result<(), String> {
    if args.dry_run {
        return print_contents(&doc.contents());
    }
    if doc.is_stdin() || doc.is_changed() {
        doc.save()?;
    }
    Ok(())
}

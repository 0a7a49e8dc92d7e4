use clap::Args;

use crate::args::{DocumentArgs, SettingsArgs};
use crate::clock::SystemClock;
use crate::cmd;
use crate::config::Config;
use crate::engine::{COMPLETE_MARKER, LineEngine};
use crate::output;

#[derive(Args)]
pub struct MarkAllArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Character written into each checkbox ("-" cancels)
    #[arg(short = 'm', long, value_name = "CHAR", default_value_t = COMPLETE_MARKER)]
    mark: char,

    #[command(flatten)]
    settings: SettingsArgs,
}

pub fn run(args: MarkAllArgs, config: &Config) -> Result<(), String> {
    let config = args.settings.apply(config);
    validate_marker(args.mark)?;

    let mut doc = args.document.open()?;
    let collector = cmd::build_collector(&config);
    let engine = LineEngine::new(&collector, &SystemClock);
    let changed = engine.mark_all_lines(&mut doc, args.mark);

    cmd::finish(&doc, &args.document)?;

    output::print_summary(
        &config,
        args.document.stdout_is_document(),
        &format!(
            "Marked {} [{}] in {}",
            output::count(changed, "task"),
            args.mark,
            doc.display_name()
        ),
    );

    Ok(())
}

/// A marker must keep the line a checkbox.
fn validate_marker(mark: char) -> Result<(), String> {
    if mark.is_whitespace() || mark == '[' || mark == ']' {
        return Err(format!("invalid marker {:?}: use a visible character other than brackets", mark));
    }
    Ok(())
}

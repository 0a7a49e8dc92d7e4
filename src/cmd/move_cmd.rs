use clap::Args;

use crate::args::{DocumentArgs, SettingsArgs};
use crate::clock::SystemClock;
use crate::cmd;
use crate::config::Config;
use crate::engine::LineEngine;
use crate::output;

#[derive(Args)]
pub struct MoveArgs {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Move finished tasks, with their nested lines, under the log header.
pub fn run(args: MoveArgs, config: &Config) -> Result<(), String> {
    let config = args.settings.apply(config);

    let mut doc = args.document.open()?;
    let collector = cmd::build_collector(&config);
    let engine = LineEngine::new(&collector, &SystemClock);
    let relocation = engine.move_completed_tasks(&mut doc);

    cmd::finish(&doc, &args.document)?;

    let to_stderr = args.document.stdout_is_document();
    if relocation.moved_tasks == 0 {
        output::print_summary(
            &config,
            to_stderr,
            &format!("No finished tasks to move in {}", doc.display_name()),
        );
    } else {
        output::print_summary(
            &config,
            to_stderr,
            &format!(
                "Moved {} ({}) under \"{}\" in {}",
                output::count(relocation.moved_tasks, "task"),
                output::count(relocation.moved_lines, "line"),
                collector.settings().log_header(),
                doc.display_name()
            ),
        );
    }
    if relocation.header_created {
        output::print_hint(&config, "log header was missing and has been added at the end");
    }

    Ok(())
}

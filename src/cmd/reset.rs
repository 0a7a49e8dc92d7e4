use clap::Args;

use crate::args::{DocumentArgs, SettingsArgs};
use crate::clock::SystemClock;
use crate::cmd;
use crate::config::Config;
use crate::engine::LineEngine;
use crate::output;

#[derive(Args)]
pub struct ResetArgs {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Reopen every finished task outside the log section.
pub fn run(args: ResetArgs, config: &Config) -> Result<(), String> {
    let config = args.settings.apply(config);

    let mut doc = args.document.open()?;
    let collector = cmd::build_collector(&config);
    let engine = LineEngine::new(&collector, &SystemClock);
    let changed = engine.reset_all_lines(&mut doc);

    cmd::finish(&doc, &args.document)?;

    output::print_summary(
        &config,
        args.document.stdout_is_document(),
        &format!(
            "Reopened {} in {}",
            output::count(changed, "task"),
            doc.display_name()
        ),
    );

    Ok(())
}

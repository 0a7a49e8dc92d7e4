use clap::Args;

use crate::args::{DocumentArgs, SettingsArgs};
use crate::clock::SystemClock;
use crate::cmd;
use crate::config::Config;
use crate::document::Document;
use crate::engine::{CANCEL_MARKER, LineEngine};
use crate::output;

#[derive(Args)]
pub struct MarkArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Line of the task, counting from 1
    #[arg(short = 'l', long, value_name = "N")]
    line: usize,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Mark the task on one line with `marker` (`x` completes, `-` cancels).
pub fn run(args: MarkArgs, marker: char, config: &Config) -> Result<(), String> {
    let config = args.settings.apply(config);

    if args.line == 0 {
        return Err("line numbers start at 1".to_string());
    }

    let doc = args.document.open()?;
    if args.line > doc.line_count() {
        return Err(format!(
            "line {} is past the end of {} ({} lines)",
            args.line,
            doc.display_name(),
            doc.line_count()
        ));
    }
    let mut doc = doc.with_cursor(args.line - 1);

    let collector = cmd::build_collector(&config);
    let engine = LineEngine::new(&collector, &SystemClock);
    let marked = engine.mark_one_line(&mut doc, marker);

    cmd::finish(&doc, &args.document)?;

    let to_stderr = args.document.stdout_is_document();
    if marked {
        let line = doc.line(args.line - 1).unwrap_or_default();
        output::print_summary(
            &config,
            to_stderr,
            &format!("Marked line {}: {}", args.line, line.trim()),
        );
        if marker == CANCEL_MARKER && !config.tasks.support_canceled_tasks {
            output::print_hint(
                &config,
                "canceled tasks stay in place on move unless tasks.support_canceled_tasks is set",
            );
        }
    } else {
        output::print_summary(
            &config,
            to_stderr,
            &format!("Line {} is not an incomplete task, nothing changed", args.line),
        );
    }

    Ok(())
}

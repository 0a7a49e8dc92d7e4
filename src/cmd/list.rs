use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::args::{FormatArgs, SettingsArgs, open_document};
use crate::clock::SystemClock;
use crate::cmd;
use crate::config::{Config, is_quiet};
use crate::document::{Document, MarkdownFile};
use crate::engine::{LineEngine, TaskEntry, TaskKind};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ListArgs {
    /// Markdown file ("-" reads stdin)
    #[arg(value_name = "FILE")]
    file: String,

    /// Only show open tasks
    #[arg(short = 'o', long, conflicts_with = "finished")]
    open: bool,

    /// Only show completed and canceled tasks
    #[arg(long)]
    finished: bool,

    #[command(flatten)]
    format: FormatArgs,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    file: String,
    header: &'a str,
    tasks: Vec<TaskEntry>,
}

pub fn run(args: ListArgs, config: &Config) -> Result<(), String> {
    let config = args.settings.apply(config);
    let format = args.format.resolve();

    let doc = open_document(&args.file)?;

    let collector = cmd::build_collector(&config);
    let engine = LineEngine::new(&collector, &SystemClock);
    let tasks: Vec<TaskEntry> = engine
        .survey(&doc.text())
        .into_iter()
        .filter(|entry| keep(entry, args.open, args.finished))
        .collect();

    let header = collector.settings().log_header();
    match format {
        OutputFormat::Pretty => output_pretty(&tasks, &doc, header, &config),
        OutputFormat::Plain => output_plain(&tasks, &doc, header),
        OutputFormat::Json => {
            let out = ListOutput {
                file: doc.display_name(),
                header,
                tasks,
            };
            let json = serde_json::to_string_pretty(&out)
                .map_err(|e| format!("JSON serialization failed: {}", e))?;
            println!("{}", json);
            Ok(())
        }
        OutputFormat::Yaml => {
            let out = ListOutput {
                file: doc.display_name(),
                header,
                tasks,
            };
            let yaml = serde_yaml::to_string(&out)
                .map_err(|e| format!("YAML serialization failed: {}", e))?;
            print!("{}", yaml);
            Ok(())
        }
    }
}

fn keep(entry: &TaskEntry, open: bool, finished: bool) -> bool {
    match (open, finished) {
        (true, _) => entry.kind == TaskKind::Incomplete,
        (_, true) => matches!(entry.kind, TaskKind::Completed | TaskKind::Canceled),
        _ => true,
    }
}

/// Row data for tabled output
#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "LINE")]
    line: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "LOG")]
    in_log: String,
    #[tabled(rename = "TASK")]
    text: String,
}

fn output_pretty(
    tasks: &[TaskEntry],
    doc: &MarkdownFile,
    header: &str,
    config: &Config,
) -> Result<(), String> {
    println!(
        "{} {}",
        output::style_path(&doc.display_name()),
        format!("(log: {})", header).dimmed()
    );
    println!("{} tasks", tasks.len().to_string().bold());
    println!();

    if tasks.is_empty() {
        if !is_quiet(config) {
            println!("{}", "Hint: tasks are lines like \"- [ ] text\"".dimmed());
        }
        return Ok(());
    }

    let text_max = output::terminal_width().saturating_sub(36).max(20);
    let rows: Vec<TableRow> = tasks
        .iter()
        .map(|t| TableRow {
            line: output::style_line_number(t.line).to_string(),
            kind: output::style_kind(t.kind).to_string(),
            in_log: if t.in_log { "✓".to_string() } else { String::new() },
            text: output::truncate_to_width(&t.text, text_max),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}

fn output_plain(tasks: &[TaskEntry], doc: &MarkdownFile, header: &str) -> Result<(), String> {
    println!("FILE: {}", doc.display_name());
    println!("HEADER: {}", header);
    println!("LINE | KIND | IN_LOG | TEXT");
    for t in tasks {
        println!("{} | {} | {} | {}", t.line, t.kind, t.in_log, t.text);
    }
    Ok(())
}

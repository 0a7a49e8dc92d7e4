use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::env::CompleteEnv;
use clap_complete::{Shell, generate};
use log::debug;

mod args;
mod clock;
mod cmd;
mod collector;
mod config;
mod document;
mod engine;
mod input;
mod output;
mod rules;
mod workspace;

#[derive(Parser)]
#[command(name = "tasklog")]
#[command(version = env!("TASKLOG_VERSION"))]
#[command(about = "Complete markdown tasks and collect them into a log section")]
#[command(
    long_about = "tasklog - Checkbox task bookkeeping for markdown notes.\n\nMarks \"- [ ]\" tasks complete or canceled (optionally stamping a date and\nstripping a pattern), reopens them, and moves finished tasks together with\ntheir indented lines under a log header such as \"## Log\"."
)]
struct Cli {
    /// Print diagnostic logs to stderr (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete the task on a line
    #[command(alias = "done")]
    Complete(cmd::mark::MarkArgs),

    /// Cancel the task on a line
    Cancel(cmd::mark::MarkArgs),

    /// Mark every open task in a file
    CompleteAll(cmd::mark_all::MarkAllArgs),

    /// Reopen every finished task outside the log section
    Reset(cmd::reset::ResetArgs),

    /// Move finished tasks under the log header
    #[command(alias = "mv")]
    Move(cmd::move_cmd::MoveArgs),

    /// List tasks with their state
    #[command(alias = "ls")]
    List(cmd::list::ListArgs),

    /// Configuration introspection
    Config(cmd::config_cmd::ConfigArgs),

    /// Generate shell completion script
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
struct CompletionArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Clone, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    // Handle dynamic shell completions
    CompleteEnv::with_factory(Cli::command).complete();

    // Use try_parse to catch errors and normalize exit code
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Exit with 0 for help/version, 1 for actual errors
            let exit_code = if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                0
            } else {
                1
            };
            process::exit(exit_code);
        }
    };

    init_logger(cli.verbose);

    if let Commands::Completion(args) = &cli.command {
        let shell = match args.shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
        };
        generate(shell, &mut Cli::command(), "tasklog", &mut io::stdout());
        return;
    }

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("cannot get cwd: {}", e);
            process::exit(1);
        }
    };
    let root = workspace::project_root(&cwd);
    debug!("project root: {}", root.display());

    let loaded_config = config::load_config(&root, &cwd);
    let config = &loaded_config.config;

    let result = match cli.command {
        Commands::Complete(args) => cmd::mark::run(args, engine::COMPLETE_MARKER, config),
        Commands::Cancel(args) => cmd::mark::run(args, engine::CANCEL_MARKER, config),
        Commands::CompleteAll(args) => cmd::mark_all::run(args, config),
        Commands::Reset(args) => cmd::reset::run(args, config),
        Commands::Move(args) => cmd::move_cmd::run(args, config),
        Commands::List(args) => cmd::list::run(args, config),
        Commands::Config(args) => cmd::config_cmd::run(args, &root),
        Commands::Completion(_) => unreachable!(), // Handled above
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

//! Configuration introspection command.
//!
//! Provides `tasklog config` subcommands:
//! - show: Display resolved configuration
//! - check: Compile task settings and report problems
//! - env: List environment variables
//! - schema: Output JSON schema
//! - init: Create template manifest

use std::fs;
use std::path::Path;

use clap::{Args, Subcommand};
use colored::Colorize;
use log::debug;

use crate::args::SettingsArgs;
use crate::collector::Collector;
use crate::config::{
    self, CONFIG_DIR, Config, ConfigSource, ENV_VARS, MANIFEST_FILE, load_config,
    template_manifest, user_config_path,
};
use crate::rules::RulesError;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show resolved configuration
    Show(ShowArgs),

    /// Validate task settings (regex, date format, checkbox values)
    Check(CheckArgs),

    /// List environment variables
    Env,

    /// Output JSON schema for manifest validation
    Schema,

    /// Create template manifest file
    Init(InitArgs),
}

#[derive(Args)]
struct ShowArgs {
    /// Show where each value came from
    #[arg(long)]
    effective: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Args)]
struct InitArgs {
    /// Directory to create manifest in (default: current directory)
    #[arg(default_value = ".")]
    path: String,

    /// Overwrite existing manifest
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, root: &Path) -> Result<(), String> {
    let cwd = std::env::current_dir().map_err(|e| format!("cannot get cwd: {}", e))?;

    match args.command {
        ConfigCommand::Show(show_args) => run_show(root, &cwd, show_args),
        ConfigCommand::Check(check_args) => run_check(root, &cwd, check_args),
        ConfigCommand::Env => run_env(),
        ConfigCommand::Schema => run_schema(),
        ConfigCommand::Init(init_args) => run_init(&cwd, init_args),
    }
}

fn run_show(root: &Path, cwd: &Path, args: ShowArgs) -> Result<(), String> {
    let mut loaded = load_config(root, cwd);
    if let Some(source) = args.settings.apply_to(&mut loaded.config) {
        loaded.sources.push(source);
    }

    if args.effective {
        print_effective(&loaded.config, &loaded.sources)?;
    } else {
        let yaml = serde_yaml::to_string(&loaded.config)
            .map_err(|e| format!("failed to serialize config: {}", e))?;
        println!("{}", yaml.trim());
    }

    Ok(())
}

fn print_effective(config: &Config, sources: &[ConfigSource]) -> Result<(), String> {
    println!("# Resolved configuration");
    println!("# Sources (in order of precedence):");
    for source in sources {
        println!("#   - {}", source);
    }
    println!("# Effective log header: {:?}", config.tasks.log_header());
    println!();

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| format!("failed to serialize config: {}", e))?;
    print!("{}", yaml);
    Ok(())
}

fn run_check(root: &Path, cwd: &Path, args: CheckArgs) -> Result<(), String> {
    let mut loaded = load_config(root, cwd);

    // Flags are checked as a second settings generation; only problems they
    // introduce are reported against them.
    let (mut collector, mut errors) = Collector::new(loaded.config.tasks.clone());
    report_errors("configuration", &errors);
    let base_generation = collector.generation();

    if args.settings.apply_to(&mut loaded.config).is_some() {
        let flag_errors = collector.replace_settings(loaded.config.tasks);
        let introduced: Vec<&RulesError> = flag_errors
            .iter()
            .filter(|e| !errors.iter().any(|base| base.to_string() == e.to_string()))
            .collect();
        for err in introduced {
            eprintln!("{} {} (command-line flags)", "error:".red().bold(), err);
        }
        errors = flag_errors;
    }
    debug!(
        "checked settings generation {} (base current: {})",
        collector.generation(),
        collector.is_current(base_generation)
    );

    if errors.is_empty() {
        println!("{} task settings are valid", "ok:".green().bold());
        return Ok(());
    }
    Err(format!("{} problem(s) in task settings", errors.len()))
}

fn report_errors(layer: &str, errors: &[RulesError]) {
    for err in errors {
        eprintln!("{} {} ({})", "error:".red().bold(), err, layer);
    }
}

fn run_env() -> Result<(), String> {
    println!("Environment Variables:");
    println!();

    for var in ENV_VARS {
        println!("  {}", var.name);
        println!("    {}", var.description);
        if let Some(values) = var.values {
            println!("    Values: {}", values);
        }
        println!("    Default: {}", var.default);
        println!("    Config path: {}", var.config_path);
        println!();
    }

    Ok(())
}

fn run_schema() -> Result<(), String> {
    println!("{}", config::json_schema());
    Ok(())
}

fn run_init(cwd: &Path, args: InitArgs) -> Result<(), String> {
    let target_dir = if args.path == "." {
        cwd.to_path_buf()
    } else {
        cwd.join(&args.path)
    };

    let config_dir = target_dir.join(CONFIG_DIR);
    let manifest_path = config_dir.join(MANIFEST_FILE);

    if manifest_path.exists() && !args.force {
        return Err(format!(
            "manifest already exists: {}\nUse --force to overwrite",
            manifest_path.display()
        ));
    }

    fs::create_dir_all(&config_dir)
        .map_err(|e| format!("failed to create {}: {}", config_dir.display(), e))?;

    fs::write(&manifest_path, template_manifest())
        .map_err(|e| format!("failed to write {}: {}", manifest_path.display(), e))?;

    println!("Created: {}", manifest_path.display());

    if let Some(user_path) = user_config_path()
        && !user_path.exists()
    {
        println!(
            "Hint: User global config can be placed at: {}",
            user_path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            path: "project".to_string(),
            force: false,
        };
        run_init(dir.path(), args).unwrap();

        let manifest = dir.path().join("project").join(CONFIG_DIR).join(MANIFEST_FILE);
        let content = fs::read_to_string(&manifest).unwrap();
        assert_eq!(content, template_manifest());
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(MANIFEST_FILE), "tasks: {}\n").unwrap();

        let err = run_init(
            dir.path(),
            InitArgs {
                path: ".".to_string(),
                force: false,
            },
        )
        .unwrap_err();
        assert!(err.contains("already exists"));

        run_init(
            dir.path(),
            InitArgs {
                path: ".".to_string(),
                force: true,
            },
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(config_dir.join(MANIFEST_FILE)).unwrap(),
            template_manifest()
        );
    }
}

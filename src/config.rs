//! Configuration system for the tasklog CLI.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (TASKLOG_*)
//! 3. Project manifest (.tasklog-config/manifest.yaml)
//! 4. User global (~/.config/tasklog/config.yaml)
//! 5. Built-in defaults (lowest priority)
//!
//! This module provides:
//! - `Config` struct with all settings
//! - `EnvVar` registry for documentation
//! - Helper functions for env var parsing
//! - Config loading and merging

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::workspace;

/// Header used when `completed_area_header` is empty.
pub const DEFAULT_LOG_HEADER: &str = "## Log";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration for tasklog.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Task recognition and rewriting settings
    pub tasks: TaskSettings,
    /// Behavior settings
    pub behavior: BehaviorConfig,
}

/// Settings consumed by the line engine.
///
/// Replaced wholesale whenever configuration changes; never mutated in place
/// once handed to a `Collector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TaskSettings {
    /// Exact text (after trim) of the log section header line
    pub completed_area_header: String,
    /// Regular expression whose matches are deleted from a line when it is marked
    pub remove_expression: String,
    /// Display format appended after marking, e.g. "YYYY-MM-DD" (empty disables)
    pub append_date_format: String,
    /// Characters accepted inside an incomplete checkbox (empty means one blank)
    pub incomplete_task_values: String,
    /// Whether `[-]` counts as completed when marking and moving
    pub support_canceled_tasks: bool,
    /// Accepted for compatibility; has no effect on moved tasks
    pub completed_area_remove_checkbox: bool,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            completed_area_header: DEFAULT_LOG_HEADER.to_string(),
            remove_expression: String::new(),
            append_date_format: String::new(),
            incomplete_task_values: String::new(),
            support_canceled_tasks: false,
            completed_area_remove_checkbox: false,
        }
    }
}

impl TaskSettings {
    /// The log header, falling back to the default when unset.
    pub fn log_header(&self) -> &str {
        let header = self.completed_area_header.trim();
        if header.is_empty() {
            DEFAULT_LOG_HEADER
        } else {
            header
        }
    }
}

/// Behavior defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Suppress summaries and hints
    pub quiet: bool,
}

// ============================================================================
// Config Source Tracking
// ============================================================================

/// Source of a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default
    Default,
    /// User global config (~/.config/tasklog/config.yaml)
    UserGlobal,
    /// Project manifest (.tasklog-config/manifest.yaml)
    ProjectManifest(String),
    /// Environment variable
    EnvVar(String),
    /// CLI flag
    CliFlag,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::UserGlobal => write!(f, "~/.config/tasklog/config.yaml"),
            ConfigSource::ProjectManifest(path) => write!(f, "{}", path),
            ConfigSource::EnvVar(name) => write!(f, "${}", name),
            ConfigSource::CliFlag => write!(f, "CLI flag"),
        }
    }
}

// ============================================================================
// Environment Variable Registry
// ============================================================================

/// Environment variable definition for documentation.
pub struct EnvVar {
    /// Variable name (e.g., "TASKLOG_LOG_HEADER")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Default value or behavior
    pub default: &'static str,
    /// Config path this maps to (e.g., "tasks.completed_area_header")
    pub config_path: &'static str,
    /// Valid values (if enumerable)
    pub values: Option<&'static str>,
}

/// Registry of all supported environment variables.
pub const ENV_VARS: &[EnvVar] = &[
    EnvVar {
        name: "NO_COLOR",
        description: "Disable colored output (standard)",
        default: "unset",
        config_path: "-",
        values: Some("any non-empty value"),
    },
    EnvVar {
        name: "TASKLOG_LOG_HEADER",
        description: "Header line of the log section completed tasks move under",
        default: "## Log",
        config_path: "tasks.completed_area_header",
        values: None,
    },
    EnvVar {
        name: "TASKLOG_REMOVE_EXPRESSION",
        description: "Regex whose matches are removed from a task when it is marked",
        default: "unset",
        config_path: "tasks.remove_expression",
        values: Some("regular expression"),
    },
    EnvVar {
        name: "TASKLOG_APPEND_DATE_FORMAT",
        description: "Date format appended to a task when it is marked",
        default: "unset (no date)",
        config_path: "tasks.append_date_format",
        values: Some("YYYY, YY, MMMM, MMM, MM, M, DD, D, HH, mm, ... and [literal] text"),
    },
    EnvVar {
        name: "TASKLOG_INCOMPLETE_VALUES",
        description: "Characters accepted inside an incomplete checkbox",
        default: "unset (single blank)",
        config_path: "tasks.incomplete_task_values",
        values: None,
    },
    EnvVar {
        name: "TASKLOG_SUPPORT_CANCELED",
        description: "Treat [-] tasks as completed when marking and moving",
        default: "false",
        config_path: "tasks.support_canceled_tasks",
        values: Some("1, true, yes"),
    },
    EnvVar {
        name: "TASKLOG_QUIET",
        description: "Suppress summaries and hint messages",
        default: "false",
        config_path: "behavior.quiet",
        values: Some("1, true, yes"),
    },
    EnvVar {
        name: "RUST_LOG",
        description: "Log filter for diagnostic output on stderr",
        default: "warn",
        config_path: "-",
        values: Some("error, warn, info, debug, trace"),
    },
];

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Parse a boolean environment variable.
///
/// Returns `Some(true)` if the variable is set to a truthy value (1, true, yes),
/// `Some(false)` if set to a falsy value (0, false, no),
/// and `None` if unset or empty.
pub fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| {
        if v.is_empty() {
            return None;
        }
        match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    })
}

/// Parse a string environment variable.
///
/// Returns `Some(value)` if set and non-empty, `None` otherwise.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Apply TASKLOG_* environment variables on top of a loaded config.
///
/// Returns the variables that were applied, for source tracking.
pub fn apply_env(config: &mut Config) -> Vec<ConfigSource> {
    let mut applied = Vec::new();

    if let Some(v) = env_string("TASKLOG_LOG_HEADER") {
        config.tasks.completed_area_header = v;
        applied.push(ConfigSource::EnvVar("TASKLOG_LOG_HEADER".to_string()));
    }
    if let Some(v) = env_string("TASKLOG_REMOVE_EXPRESSION") {
        config.tasks.remove_expression = v;
        applied.push(ConfigSource::EnvVar("TASKLOG_REMOVE_EXPRESSION".to_string()));
    }
    if let Some(v) = env_string("TASKLOG_APPEND_DATE_FORMAT") {
        config.tasks.append_date_format = v;
        applied.push(ConfigSource::EnvVar("TASKLOG_APPEND_DATE_FORMAT".to_string()));
    }
    if let Some(v) = env_string("TASKLOG_INCOMPLETE_VALUES") {
        config.tasks.incomplete_task_values = v;
        applied.push(ConfigSource::EnvVar("TASKLOG_INCOMPLETE_VALUES".to_string()));
    }
    if let Some(v) = env_bool("TASKLOG_SUPPORT_CANCELED") {
        config.tasks.support_canceled_tasks = v;
        applied.push(ConfigSource::EnvVar("TASKLOG_SUPPORT_CANCELED".to_string()));
    }
    if let Some(v) = env_bool("TASKLOG_QUIET") {
        config.behavior.quiet = v;
        applied.push(ConfigSource::EnvVar("TASKLOG_QUIET".to_string()));
    }

    applied
}

// ============================================================================
// Config Loading
// ============================================================================

/// Manifest file name within .tasklog-config/
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Config directory name
pub const CONFIG_DIR: &str = ".tasklog-config";

/// Result of loading configuration with source tracking.
#[derive(Debug)]
pub struct LoadedConfig {
    /// The merged configuration
    pub config: Config,
    /// Sources that contributed to this config (in order of application)
    pub sources: Vec<ConfigSource>,
}

/// Load configuration from files and environment.
///
/// Resolution order (later overrides earlier):
/// 1. Built-in defaults
/// 2. User global (~/.config/tasklog/config.yaml)
/// 3. Project manifests (walk from project_root to cwd)
/// 4. TASKLOG_* environment variables
///
/// CLI flags are applied afterwards by the settings args.
pub fn load_config(project_root: &Path, cwd: &Path) -> LoadedConfig {
    let mut config = Config::default();
    let mut sources = vec![ConfigSource::Default];

    if let Some(user_config_path) = user_config_path()
        && let Some(user_config) = load_manifest(&user_config_path)
    {
        merge(&mut config, &user_config);
        sources.push(ConfigSource::UserGlobal);
    }

    for path in collect_manifest_paths(project_root, cwd) {
        if let Some(manifest_config) = load_manifest(&path) {
            let rel_path = workspace::display_relative(project_root, &path);
            merge(&mut config, &manifest_config);
            sources.push(ConfigSource::ProjectManifest(rel_path));
        }
    }

    sources.extend(apply_env(&mut config));

    debug!("loaded config from {} source(s)", sources.len());
    LoadedConfig { config, sources }
}

/// Get the user config file path (~/.config/tasklog/config.yaml).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tasklog").join("config.yaml"))
}

/// Load a manifest file.
///
/// Returns None if it doesn't exist; unreadable or malformed files are skipped
/// with a warning.
pub fn load_manifest(path: &Path) -> Option<Config> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("skipping config {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_yaml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("skipping config {}: {}", path.display(), e);
            None
        }
    }
}

/// Collect manifest paths from project_root to cwd (inclusive).
///
/// Returns paths in order from root to cwd (so later ones override earlier).
fn collect_manifest_paths(project_root: &Path, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let project_root = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());

    let mut push_if_exists = |dir: &Path| {
        let manifest = dir.join(CONFIG_DIR).join(MANIFEST_FILE);
        if manifest.exists() {
            paths.push(manifest);
        }
    };

    let mut current = project_root.clone();
    push_if_exists(&current);

    if let Ok(rel_path) = cwd.strip_prefix(&project_root) {
        for component in rel_path.components() {
            current = current.join(component);
            push_if_exists(&current);
        }
    }

    paths
}

/// Merge overlay config into base config.
///
/// Non-default values in overlay override values in base.
pub fn merge(base: &mut Config, overlay: &Config) {
    let default_tasks = TaskSettings::default();
    if overlay.tasks.completed_area_header != default_tasks.completed_area_header {
        base.tasks.completed_area_header = overlay.tasks.completed_area_header.clone();
    }
    if overlay.tasks.remove_expression != default_tasks.remove_expression {
        base.tasks.remove_expression = overlay.tasks.remove_expression.clone();
    }
    if overlay.tasks.append_date_format != default_tasks.append_date_format {
        base.tasks.append_date_format = overlay.tasks.append_date_format.clone();
    }
    if overlay.tasks.incomplete_task_values != default_tasks.incomplete_task_values {
        base.tasks.incomplete_task_values = overlay.tasks.incomplete_task_values.clone();
    }
    if overlay.tasks.support_canceled_tasks != default_tasks.support_canceled_tasks {
        base.tasks.support_canceled_tasks = overlay.tasks.support_canceled_tasks;
    }
    if overlay.tasks.completed_area_remove_checkbox != default_tasks.completed_area_remove_checkbox
    {
        base.tasks.completed_area_remove_checkbox = overlay.tasks.completed_area_remove_checkbox;
    }

    let default_behavior = BehaviorConfig::default();
    if overlay.behavior.quiet != default_behavior.quiet {
        base.behavior.quiet = overlay.behavior.quiet;
    }
}

/// Generate JSON schema for the config.
pub fn json_schema() -> String {
    let schema = schemars::schema_for!(Config);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

/// Check if quiet mode is enabled (suppress summaries and hints).
pub fn is_quiet(config: &Config) -> bool {
    config.behavior.quiet
}

/// Generate a template manifest with comments.
pub fn template_manifest() -> String {
    r###"# tasklog configuration manifest
# Place in .tasklog-config/manifest.yaml

# Task settings (uncomment to customize)
# tasks:
#   completed_area_header: "## Log"   # header completed tasks are moved under
#   remove_expression: ""             # regex removed from a task when marked, e.g. "#todo\\s*"
#   append_date_format: ""            # e.g. "YYYY-MM-DD" or "[(]MMM D, YYYY[)]"
#   incomplete_task_values: ""        # e.g. " >" to also complete [>] tasks
#   support_canceled_tasks: false     # move [-] tasks like completed ones
#   completed_area_remove_checkbox: false

# Behavior settings
# behavior:
#   quiet: false
"###
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to serialize env var tests
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_MUTEX.lock().unwrap();

        let originals: Vec<_> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(*k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: env access is serialized by ENV_MUTEX
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        let result = f();

        for (k, original) in originals {
            // SAFETY: env access is serialized by ENV_MUTEX
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        result
    }

    #[test]
    fn test_env_bool() {
        let cases = vec![
            (Some("1"), Some(true)),
            (Some("TRUE"), Some(true)),
            (Some("yes"), Some(true)),
            (Some("0"), Some(false)),
            (Some("no"), Some(false)),
            (Some(""), None),
            (Some("maybe"), None),
            (None, None),
        ];

        for (value, want) in cases {
            with_env(&[("TASKLOG_TEST_BOOL", value)], || {
                let got = env_bool("TASKLOG_TEST_BOOL");
                assert_eq!(got, want, "env_bool with {:?} = {:?}, want {:?}", value, got, want);
            });
        }
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars = [
            ("TASKLOG_LOG_HEADER", Some("## Done")),
            ("TASKLOG_REMOVE_EXPRESSION", None),
            ("TASKLOG_APPEND_DATE_FORMAT", Some("YYYY-MM-DD")),
            ("TASKLOG_INCOMPLETE_VALUES", None),
            ("TASKLOG_SUPPORT_CANCELED", Some("true")),
            ("TASKLOG_QUIET", None),
        ];
        with_env(&vars, || {
            let mut config = Config::default();
            let applied = apply_env(&mut config);

            assert_eq!(config.tasks.completed_area_header, "## Done");
            assert_eq!(config.tasks.append_date_format, "YYYY-MM-DD");
            assert!(config.tasks.support_canceled_tasks);
            assert!(config.tasks.remove_expression.is_empty());
            assert_eq!(applied.len(), 3);
            assert!(applied.contains(&ConfigSource::EnvVar("TASKLOG_LOG_HEADER".to_string())));
        });
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.tasks.completed_area_header, "## Log");
        assert!(config.tasks.remove_expression.is_empty());
        assert!(config.tasks.append_date_format.is_empty());
        assert!(!config.tasks.support_canceled_tasks);
        assert!(!config.behavior.quiet);
    }

    #[test]
    fn test_log_header_fallback() {
        let cases = vec![
            ("## Log", "## Log"),
            ("  ## Done  ", "## Done"),
            ("", "## Log"),
            ("   ", "## Log"),
        ];
        for (header, want) in cases {
            let settings = TaskSettings {
                completed_area_header: header.to_string(),
                ..TaskSettings::default()
            };
            assert_eq!(settings.log_header(), want, "log_header for {:?}", header);
        }
    }

    #[test]
    fn test_manifest_parses_partial_yaml() {
        let yaml = "tasks:\n  append_date_format: \"YYYY-MM-DD\"\n  support_canceled_tasks: true\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.tasks.append_date_format, "YYYY-MM-DD");
        assert!(config.tasks.support_canceled_tasks);
        // Unspecified fields keep their defaults
        assert_eq!(config.tasks.completed_area_header, "## Log");
    }

    #[test]
    fn test_load_manifest_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "tasks: [not, a, map]").unwrap();
        assert!(load_manifest(&path).is_none());
        assert!(load_manifest(&dir.path().join("missing.yaml")).is_none());
    }

    #[test]
    fn test_load_config_walks_manifests() {
        let root = tempfile::tempdir().unwrap();
        let sub = root.path().join("notes");
        fs::create_dir_all(sub.join(CONFIG_DIR)).unwrap();
        fs::create_dir_all(root.path().join(CONFIG_DIR)).unwrap();
        fs::write(
            root.path().join(CONFIG_DIR).join(MANIFEST_FILE),
            "tasks:\n  completed_area_header: \"## Archive\"\n  remove_expression: \"#now\"\n",
        )
        .unwrap();
        fs::write(
            sub.join(CONFIG_DIR).join(MANIFEST_FILE),
            "tasks:\n  remove_expression: \"#later\"\n",
        )
        .unwrap();

        let paths = collect_manifest_paths(root.path(), &sub);
        assert_eq!(paths.len(), 2);

        let mut config = Config::default();
        for path in &paths {
            merge(&mut config, &load_manifest(path).unwrap());
        }
        assert_eq!(config.tasks.completed_area_header, "## Archive");
        assert_eq!(config.tasks.remove_expression, "#later");
    }

    #[test]
    fn test_json_schema_generates() {
        let schema = json_schema();
        assert!(schema.contains("Config"));
        assert!(schema.contains("TaskSettings"));
        assert!(schema.contains("append_date_format"));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Default.to_string(), "default");
        assert_eq!(
            ConfigSource::EnvVar("TASKLOG_QUIET".to_string()).to_string(),
            "$TASKLOG_QUIET"
        );
        assert_eq!(ConfigSource::CliFlag.to_string(), "CLI flag");
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = Config::default();
        base.tasks.remove_expression = "#old".to_string();
        let mut overlay = Config::default();
        overlay.tasks.append_date_format = "YYYY".to_string();

        merge(&mut base, &overlay);

        assert_eq!(base.tasks.append_date_format, "YYYY");
        // Default-valued overlay fields do not clobber the base
        assert_eq!(base.tasks.remove_expression, "#old");
        assert_eq!(base.tasks.completed_area_header, "## Log");
    }

    #[test]
    fn test_template_manifest_is_valid_yaml() {
        let template = template_manifest();
        assert!(template.contains("# tasklog configuration manifest"));
        assert!(template.contains("tasks:"));
        assert!(template.contains(r##"e.g. "#todo\\s*""##));
        assert!(template.contains("#   quiet: false"));
        // Fully commented out, so it parses to defaults
        let parsed: Option<Config> = serde_yaml::from_str(&template).ok();
        assert!(parsed.is_none_or(|c| c == Config::default()));
    }
}

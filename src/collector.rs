//! Settings context handed to every engine operation.
//!
//! A `Collector` owns one settings generation: the `TaskSettings` it was built
//! from and the matchers compiled from them. Replacing settings recompiles and
//! swaps the matcher cache as a whole, then bumps `generation` so holders of an
//! older snapshot can tell they need to refresh.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::TaskSettings;
use crate::rules::{CompiledMatchers, RulesError};

#[derive(Debug, Clone)]
pub struct Collector {
    settings: Arc<TaskSettings>,
    matchers: Arc<CompiledMatchers>,
    generation: u64,
}

impl Collector {
    /// Build the first generation. Configuration errors are returned, not raised.
    pub fn new(settings: TaskSettings) -> (Self, Vec<RulesError>) {
        let (matchers, errors) = CompiledMatchers::compile(&settings);
        warn_unenforced(&settings);
        let collector = Self {
            settings: Arc::new(settings),
            matchers: Arc::new(matchers),
            generation: 1,
        };
        (collector, errors)
    }

    /// Replace the settings wholesale and recompile.
    ///
    /// Errors are reported once here, for the new generation only.
    pub fn replace_settings(&mut self, settings: TaskSettings) -> Vec<RulesError> {
        let (matchers, errors) = CompiledMatchers::compile(&settings);
        if !self.settings.completed_area_remove_checkbox {
            warn_unenforced(&settings);
        }
        self.settings = Arc::new(settings);
        self.matchers = Arc::new(matchers);
        self.generation += 1;
        debug!("settings generation {}", self.generation);
        errors
    }

    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    pub fn matchers(&self) -> &CompiledMatchers {
        &self.matchers
    }

    /// Monotonic counter, incremented on every `replace_settings`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a snapshot taken at `generation` still reflects current settings.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

fn warn_unenforced(settings: &TaskSettings) {
    if settings.completed_area_remove_checkbox {
        warn!("completed_area_remove_checkbox is set but has no effect on moved tasks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_compiles_matchers() {
        let settings = TaskSettings {
            append_date_format: "YYYY-MM-DD".to_string(),
            ..TaskSettings::default()
        };
        let (collector, errors) = Collector::new(settings);

        assert!(errors.is_empty());
        assert_eq!(collector.generation(), 1);
        assert!(collector.matchers().reset.is_some());
        assert!(collector.matchers().remove.is_none());
        assert_eq!(collector.settings().log_header(), "## Log");
    }

    #[test]
    fn test_replace_settings_bumps_generation() {
        let (mut collector, _) = Collector::new(TaskSettings::default());
        let snapshot = collector.generation();
        assert!(collector.is_current(snapshot));

        let errors = collector.replace_settings(TaskSettings {
            remove_expression: "#today".to_string(),
            ..TaskSettings::default()
        });

        assert!(errors.is_empty());
        assert!(!collector.is_current(snapshot));
        assert_eq!(collector.generation(), snapshot + 1);
        assert!(collector.matchers().remove.is_some());
    }

    #[test]
    fn test_replace_settings_reports_errors_for_new_generation() {
        let (mut collector, _) = Collector::new(TaskSettings {
            remove_expression: "#ok".to_string(),
            ..TaskSettings::default()
        });

        let errors = collector.replace_settings(TaskSettings {
            remove_expression: "(".to_string(),
            ..TaskSettings::default()
        });

        assert_eq!(errors.len(), 1);
        // The broken expression disables removal rather than keeping the old one
        assert!(collector.matchers().remove.is_none());
        assert_eq!(collector.settings().remove_expression, "(");
    }

    #[test]
    fn test_clone_is_a_stable_snapshot() {
        let (mut collector, _) = Collector::new(TaskSettings::default());
        let snapshot = collector.clone();

        collector.replace_settings(TaskSettings {
            completed_area_header: "## Done".to_string(),
            ..TaskSettings::default()
        });

        assert_eq!(snapshot.settings().log_header(), "## Log");
        assert_eq!(collector.settings().log_header(), "## Done");
        assert!(!collector.is_current(snapshot.generation()));
    }
}

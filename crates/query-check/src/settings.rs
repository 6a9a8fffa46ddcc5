//! Validation limits loaded via OrthoConfig.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use query_schema::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, ValidationLimits};
use serde::Deserialize;

use crate::check_cli::CliError;

/// Structural budgets applied to every checked document.
///
/// Values come from `QUERY_CHECK_*` environment variables or a
/// configuration file; unset values fall back to the library defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "QUERY_CHECK")]
pub struct CheckSettings {
    /// Maximum nesting depth of a document.
    #[ortho_config(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
    /// Maximum number of nodes visited in one document.
    #[ortho_config(default = DEFAULT_MAX_NODES)]
    pub max_nodes: usize,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl CheckSettings {
    /// Loads settings from the environment and configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] when a configured value is malformed.
    pub fn from_environment() -> Result<Self, CliError> {
        Self::load_from_iter([OsString::from("query-check")]).map_err(|error| CliError::Config {
            message: error.to_string(),
        })
    }

    /// Limits to validate with.
    #[must_use]
    pub const fn limits(&self) -> ValidationLimits {
        ValidationLimits::new(self.max_depth, self.max_nodes)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for limit configuration parsing.

    #![expect(
        clippy::expect_used,
        reason = "test code uses expect for clear failure messages"
    )]

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env([
            ("QUERY_CHECK_MAX_DEPTH", None::<String>),
            ("QUERY_CHECK_MAX_NODES", None::<String>),
        ]);

        let settings = CheckSettings::from_environment().expect("config should load");

        assert_eq!(settings.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(settings.max_nodes, DEFAULT_MAX_NODES);
        assert_eq!(settings.limits(), ValidationLimits::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("QUERY_CHECK_MAX_DEPTH", Some("6".to_owned())),
            ("QUERY_CHECK_MAX_NODES", Some("128".to_owned())),
        ]);

        let settings = CheckSettings::from_environment().expect("config should load");

        assert_eq!(settings.limits(), ValidationLimits::new(6, 128));
    }

    #[rstest]
    fn partial_overrides_keep_the_other_default() {
        let _guard = lock_env([
            ("QUERY_CHECK_MAX_DEPTH", None::<String>),
            ("QUERY_CHECK_MAX_NODES", Some("512".to_owned())),
        ]);

        let settings = CheckSettings::from_environment().expect("config should load");

        assert_eq!(settings.limits(), ValidationLimits::new(DEFAULT_MAX_DEPTH, 512));
    }

    #[rstest]
    fn malformed_values_are_reported() {
        let _guard = lock_env([
            ("QUERY_CHECK_MAX_DEPTH", Some("deep".to_owned())),
            ("QUERY_CHECK_MAX_NODES", None::<String>),
        ]);

        let error = CheckSettings::from_environment().expect_err("depth is not a number");

        assert!(matches!(error, CliError::Config { .. }));
    }
}

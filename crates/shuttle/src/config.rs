//! Reader synthesis configuration.
//!
//! Settings are layered by `ortho_config`: defaults, then an optional
//! `.shuttle.toml`, then `SHUTTLE_*` environment variables, then command-line
//! flags.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable overriding the log filter.
pub const ENV_LOG_FILTER: &str = "SHUTTLE_LOG_FILTER";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "SHUTTLE_LOG_FORMAT";
/// Environment variable enabling plan dumps.
pub const ENV_DUMP_PLAN: &str = "SHUTTLE_DUMP_PLAN";
/// Environment variable turning synthesis off.
pub const ENV_DISABLE_SYNTHESIS: &str = "SHUTTLE_DISABLE_SYNTHESIS";

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Settings for building and running readers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SHUTTLE")]
#[serde(default)]
pub struct SynthesisConfig {
    log_filter: String,
    log_format: LogFormat,
    dump_plan: bool,
    disable_synthesis: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
            dump_plan: false,
            disable_synthesis: false,
        }
    }
}

impl SynthesisConfig {
    /// Loads the configuration file and `SHUTTLE_*` environment layers,
    /// leaving the process arguments to the host application.
    ///
    /// # Errors
    ///
    /// Returns the [`OrthoError`] raised by a malformed file or an invalid
    /// variable.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shuttle::SynthesisConfig;
    ///
    /// let config = SynthesisConfig::from_env().expect("valid configuration");
    /// assert!(!config.log_filter().is_empty());
    /// ```
    pub fn from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter([OsString::from(env!("CARGO_PKG_NAME"))])
    }

    /// Returns the log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns `true` if compiled plans are logged operation by operation.
    #[must_use]
    pub const fn dump_plan(&self) -> bool {
        self.dump_plan
    }

    /// Returns `false` if readers must run on their fallback alone.
    #[must_use]
    pub const fn synthesis_enabled(&self) -> bool {
        !self.disable_synthesis
    }

    /// Sets the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Sets the log output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Turns plan dumps on or off.
    #[must_use]
    pub const fn with_dump_plan(mut self, dump_plan: bool) -> Self {
        self.dump_plan = dump_plan;
        self
    }

    /// Turns synthesis on or off.
    #[must_use]
    pub const fn with_synthesis(mut self, enabled: bool) -> Self {
        self.disable_synthesis = !enabled;
        self
    }
}

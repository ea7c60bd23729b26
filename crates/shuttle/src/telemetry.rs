//! Tracing subscriber setup for reader build and dispatch logs.
//!
//! Build events go to the `shuttle::build` target and per-message events to
//! `shuttle::dispatch`, so a filter such as `shuttle::dispatch=warn` keeps
//! the hot path quiet while plan dumps stay visible.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::{LogFormat, SynthesisConfig};

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that a subscriber is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Returns the format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Rejected expression.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another global subscriber is already in place.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global tracing subscriber described by `config`.
///
/// Only the first call installs anything. Later calls return the handle of
/// that first installation and ignore their own configuration.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter does not parse or a subscriber
/// from elsewhere already owns the global slot.
///
/// # Examples
///
/// ```rust
/// use shuttle::{LogFormat, SynthesisConfig, telemetry};
///
/// # fn main() -> Result<(), shuttle::telemetry::TelemetryError> {
/// let handle = telemetry::initialise(&SynthesisConfig::default())?;
/// let again = telemetry::initialise(&SynthesisConfig::default())?;
/// assert_eq!(handle, again);
/// assert_eq!(handle.format(), LogFormat::Json);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &SynthesisConfig) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            tracing::subscriber::set_global_default(subscriber_for(config)?)?;
            Ok::<_, TelemetryError>(config.log_format())
        })
        .map(|format| TelemetryHandle { format: *format })
}

fn subscriber_for(config: &SynthesisConfig) -> Result<BoxedSubscriber, TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            message: error.to_string(),
        })?;
    let stderr = io::stderr();
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(stderr.is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}

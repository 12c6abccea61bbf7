//! Log subscriber setup shared by the binaries. Logs go to stderr so stdout
//! stays a clean JSON channel.

use tracing_subscriber::EnvFilter;

use crate::error::TelemetryError;

/// `RUST_LOG` wins when set; otherwise `level` (e.g. `info`, `disclosure_engine=debug`).
pub fn init(level: &str) -> Result<(), TelemetryError> {
  let env_filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(_) => EnvFilter::try_new(level).map_err(|source| TelemetryError::EnvFilter {
      value: level.to_string(),
      source,
    })?,
  };

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .compact()
    .with_ansi(false)
    .try_init()
    .map_err(TelemetryError::Subscriber)
}

//! Service configuration: engine settings plus the HTTP surface.

use std::net::{IpAddr, Ipv4Addr};

use disclosure_engine::{ConfigError, EngineConfig};

pub const DEFAULT_PORT: u16 = 5005;
/// Characters of document text kept per request.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 2_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
  pub host: IpAddr,
  pub port: u16,
  pub max_text_length: usize,
  pub engine: EngineConfig,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      // Internal only unless HOST says otherwise.
      host: IpAddr::V4(Ipv4Addr::LOCALHOST),
      port: DEFAULT_PORT,
      max_text_length: DEFAULT_MAX_TEXT_LENGTH,
      engine: EngineConfig::default(),
    }
  }
}

impl ServiceConfig {
  /// Engine variables plus `HOST`, `PORT` and `MAX_TEXT_LENGTH`.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut cfg = Self {
      engine: EngineConfig::from_lookup(&lookup)?,
      ..Self::default()
    };
    if let Some(host) = lookup("HOST") {
      cfg.host = host
        .trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::invalid_env("HOST", e.to_string()))?;
    }
    if let Some(port) = lookup("PORT") {
      cfg.port = port
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::invalid_env("PORT", e.to_string()))?;
    }
    if let Some(max) = lookup("MAX_TEXT_LENGTH") {
      cfg.max_text_length = match max.trim().parse::<usize>() {
        Ok(0) => return Err(ConfigError::invalid_env("MAX_TEXT_LENGTH", "must be positive")),
        Ok(n) => n,
        Err(e) => return Err(ConfigError::invalid_env("MAX_TEXT_LENGTH", e.to_string())),
      };
    }
    Ok(cfg)
  }

  /// Request body cap: UTF-8 text at up to 4 bytes per char, plus room for
  /// the JSON envelope and context.
  pub fn body_limit(&self) -> usize {
    self.max_text_length.saturating_mul(4).saturating_add(64 * 1024)
  }
}

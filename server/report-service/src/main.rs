//! Binary entrypoint for the report service.

use std::net::SocketAddr;
use std::sync::Arc;

use disclosure_engine::{telemetry, RuleSet};
use report_service::{AppState, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = ServiceConfig::from_env()?;
  telemetry::init(&config.engine.log_level)?;

  // A missing rule file should not keep the service down; reload later.
  let rules = RuleSet::load_or_empty(&config.engine.rules_path);
  let addr = SocketAddr::new(config.host, config.port);
  let state = Arc::new(AppState::new(config, rules));
  let app = report_service::router(state);

  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!(%addr, "report-service listening");
  axum::serve(listener, app).await?;

  Ok(())
}

//! HTTP handlers for the report service.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use disclosure_engine::RuleSet;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;
use crate::types::{AnalyzeRequest, Report, ReportList, ReportMetadata, ReportStatus};
use crate::validate;

pub async fn root() -> Json<Value> {
  Json(json!({
    "message": "CloseGuard report service is running",
    "version": env!("CARGO_PKG_VERSION"),
  }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
  let rules = state.engine.rules();
  Json(json!({
    "status": "healthy",
    "rules_loaded": rules.len(),
    "rules_digest": rules.digest(),
    "reports": state.reports.len(),
  }))
}

pub async fn analyze(
  State(state): State<Arc<AppState>>,
  Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Report>, ServiceError> {
  let text = validate::document_text(&req.text, state.config.max_text_length)?;
  if let Some(ctx) = &req.context {
    validate::context(ctx)?;
  }
  let filename = validate::filename(req.filename.as_deref());
  let context = req.context;

  let started = Instant::now();
  let worker = Arc::clone(&state);
  // Pattern matching is CPU-bound; keep it off the async workers.
  let (analysis, text_length) = tokio::task::spawn_blocking(move || {
    let analysis = worker.engine.analyze(&text, context.as_ref());
    (analysis, text.chars().count())
  })
  .await
  .map_err(|e| ServiceError::Internal(e.to_string()))?;

  let report = Report {
    id: Uuid::new_v4().to_string(),
    status: ReportStatus::Completed,
    flags: analysis.flags,
    analytics: analysis.analytics,
    metadata: ReportMetadata {
      filename,
      text_length,
      created_at: Utc::now(),
      processing_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    },
    rules_digest: analysis.rules_digest,
  };
  info!(
    report = %report.id,
    flags = report.analytics.total_flags,
    score = report.analytics.forensic_score,
    ms = report.metadata.processing_ms,
    "report created"
  );
  state.reports.insert(report.clone());
  Ok(Json(report))
}

pub async fn get_report(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<Report>, ServiceError> {
  let id = validate::report_id(&id)?;
  state
    .reports
    .get(id)
    .map(Json)
    .ok_or_else(|| ServiceError::NotFound("Report not found".into()))
}

pub async fn list_reports(State(state): State<Arc<AppState>>) -> Json<ReportList> {
  let reports = state.reports.list();
  Json(ReportList {
    count: reports.len(),
    reports,
  })
}

pub async fn delete_report(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
  let id = validate::report_id(&id)?;
  match state.reports.remove(id) {
    Some(_) => {
      info!(report = %id, "report deleted");
      Ok(Json(json!({ "message": "Report deleted successfully" })))
    }
    None => Err(ServiceError::NotFound("Report not found".into())),
  }
}

pub async fn debug_rules(State(state): State<Arc<AppState>>) -> Json<Value> {
  let rules = state.engine.rules();
  Json(json!({
    "rules_summary": rules.summary(),
    "validation": rules.validate(),
    "rules_digest": rules.digest(),
  }))
}

/// Re-read the configured rule file and swap it in. A broken file leaves the
/// current rules active.
pub async fn reload_rules(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ServiceError> {
  let path = state.config.engine.rules_path.clone();
  let rules = tokio::task::spawn_blocking(move || RuleSet::load(&path))
    .await
    .map_err(|e| ServiceError::Internal(e.to_string()))??;

  let previous = state.engine.replace_rules(rules);
  let current = state.engine.rules();
  Ok(Json(json!({
    "rules_summary": current.summary(),
    "rules_digest": current.digest(),
    "previous_digest": previous.digest(),
  })))
}

//! Shared service state: the engine and the in-memory report store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use disclosure_engine::{Engine, RuleSet};

use crate::config::ServiceConfig;
use crate::types::{Report, ReportSummary};

pub struct AppState {
  pub config: ServiceConfig,
  pub engine: Engine,
  pub reports: ReportStore,
}

impl AppState {
  pub fn new(config: ServiceConfig, rules: RuleSet) -> Self {
    let engine = Engine::new(rules, config.engine.scoring);
    Self {
      config,
      engine,
      reports: ReportStore::default(),
    }
  }
}

/// Reports live for the life of the process.
#[derive(Debug, Default)]
pub struct ReportStore {
  reports: Mutex<HashMap<String, Report>>,
}

impl ReportStore {
  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Report>> {
    self.reports.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn insert(&self, report: Report) {
    self.lock().insert(report.id.clone(), report);
  }

  pub fn get(&self, id: &str) -> Option<Report> {
    self.lock().get(id).cloned()
  }

  pub fn remove(&self, id: &str) -> Option<Report> {
    self.lock().remove(id)
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Newest first; ties broken by id so the order is stable.
  pub fn list(&self) -> Vec<ReportSummary> {
    let mut rows: Vec<ReportSummary> = self.lock().values().map(ReportSummary::from).collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    rows
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{ReportMetadata, ReportStatus};
  use chrono::{TimeZone, Utc};
  use disclosure_engine::{Analytics, RiskLevel};

  fn report(id: &str, minute: u32) -> Report {
    Report {
      id: id.into(),
      status: ReportStatus::Completed,
      flags: Vec::new(),
      analytics: Analytics {
        forensic_score: 100,
        total_flags: 0,
        high_severity: 0,
        medium_severity: 0,
        low_severity: 0,
        risk_level: RiskLevel::Low,
      },
      metadata: ReportMetadata {
        filename: format!("{}.pdf", id),
        text_length: 10,
        created_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, minute, 0).unwrap(),
        processing_ms: 1,
      },
      rules_digest: "d".into(),
    }
  }

  #[test]
  fn list_is_newest_first() {
    let store = ReportStore::default();
    store.insert(report("report-aaaa", 1));
    store.insert(report("report-bbbb", 30));
    store.insert(report("report-cccc", 15));
    let ids: Vec<_> = store.list().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, ["report-bbbb", "report-cccc", "report-aaaa"]);
  }

  #[test]
  fn remove_returns_report_once() {
    let store = ReportStore::default();
    store.insert(report("report-aaaa", 1));
    assert!(store.remove("report-aaaa").is_some());
    assert!(store.remove("report-aaaa").is_none());
    assert!(store.is_empty());
  }
}

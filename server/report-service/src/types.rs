//! Request/response types for the report service.

use chrono::{DateTime, Utc};
use disclosure_engine::{Analytics, Flag, RiskLevel, UserContext};
use serde::{Deserialize, Serialize};

/// `POST /analyze` body. Text is already extracted from the PDF.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
  #[serde(default)]
  pub filename: Option<String>,
  pub text: String,
  #[serde(default)]
  pub context: Option<UserContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
  Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
  pub filename: String,
  /// Characters analyzed, after sanitizing.
  pub text_length: usize,
  pub created_at: DateTime<Utc>,
  pub processing_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
  pub id: String,
  pub status: ReportStatus,
  pub flags: Vec<Flag>,
  pub analytics: Analytics,
  pub metadata: ReportMetadata,
  pub rules_digest: String,
}

/// One row of `GET /reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
  pub id: String,
  pub filename: String,
  pub forensic_score: u8,
  pub risk_level: RiskLevel,
  pub total_flags: usize,
  pub created_at: DateTime<Utc>,
}

impl From<&Report> for ReportSummary {
  fn from(report: &Report) -> Self {
    Self {
      id: report.id.clone(),
      filename: report.metadata.filename.clone(),
      forensic_score: report.analytics.forensic_score,
      risk_level: report.analytics.risk_level,
      total_flags: report.analytics.total_flags,
      created_at: report.metadata.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportList {
  pub reports: Vec<ReportSummary>,
  pub count: usize,
}

//! Forensic score: start at the configured maximum, deduct per flag by
//! severity, floor at 0.

use crate::config::ScoringConfig;
use crate::types::{Analytics, Flag, RiskLevel, Severity};

/// Flags per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
  pub high: usize,
  pub medium: usize,
  pub low: usize,
}

impl SeverityCounts {
  pub fn tally(flags: &[Flag]) -> Self {
    flags.iter().fold(Self::default(), |mut counts, flag| {
      match flag.severity {
        Severity::High => counts.high += 1,
        Severity::Medium => counts.medium += 1,
        Severity::Low => counts.low += 1,
      }
      counts
    })
  }
}

/// Score 0..=`max_score` plus the severity histogram it was derived from.
pub fn score(flags: &[Flag], cfg: &ScoringConfig) -> (u8, SeverityCounts) {
  let counts = SeverityCounts::tally(flags);
  let deductions = counts.high as u64 * cfg.high_weight as u64
    + counts.medium as u64 * cfg.medium_weight as u64
    + counts.low as u64 * cfg.low_weight as u64;
  let remaining = (cfg.max_score as u64).saturating_sub(deductions);
  (remaining as u8, counts)
}

pub fn analytics(flags: &[Flag], cfg: &ScoringConfig) -> Analytics {
  let (forensic_score, counts) = score(flags, cfg);
  Analytics {
    forensic_score,
    total_flags: flags.len(),
    high_severity: counts.high,
    medium_severity: counts.medium,
    low_severity: counts.low,
    risk_level: RiskLevel::from_score(forensic_score),
  }
}

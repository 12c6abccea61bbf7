//! Core types for the disclosure engine (JSON contracts + findings).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the caller sends)
// ---------------------------------------------------------------------------

/// One analysis request. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeInput {
  pub text: String,
  #[serde(default)]
  pub context: Option<UserContext>,
}

/// Buyer expectations and promises made to them. Read-only during analysis.
///
/// Field names are snake_case; the camelCase names sent by the web client are
/// accepted as aliases. Every promise and flag the client omits is `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
  #[serde(alias = "expectedLoanType")]
  pub expected_loan_type: Option<String>,
  #[serde(alias = "expectedInterestRate")]
  pub expected_interest_rate: Option<f64>,
  #[serde(alias = "expectedClosingCosts")]
  pub expected_closing_costs: Option<f64>,

  #[serde(alias = "expectedPurchasePrice")]
  pub expected_purchase_price: Option<f64>,
  #[serde(alias = "expectedLoanAmount")]
  pub expected_loan_amount: Option<f64>,

  #[serde(alias = "promisedZeroClosingCosts")]
  pub promised_zero_closing_costs: bool,
  #[serde(alias = "promisedLenderCredit")]
  pub promised_lender_credit: Option<f64>,
  #[serde(alias = "promisedSellerCredit")]
  pub promised_seller_credit: Option<f64>,
  #[serde(alias = "promisedRebate")]
  pub promised_rebate: Option<f64>,

  #[serde(alias = "usedBuildersPreferredLender")]
  pub used_builders_preferred_lender: bool,
  #[serde(alias = "builderName")]
  pub builder_name: Option<String>,

  #[serde(alias = "builderPromisedToCoverTitleFees")]
  pub builder_promised_to_cover_title_fees: bool,
  #[serde(alias = "builderPromisedToCoverEscrowFees")]
  pub builder_promised_to_cover_escrow_fees: bool,
  #[serde(alias = "builderPromisedToCoverInspection")]
  pub builder_promised_to_cover_inspection: bool,

  #[serde(alias = "hadBuyerAgent")]
  pub has_buyer_agent_representation: bool,
  #[serde(alias = "buyerAgentName")]
  pub buyer_agent_name: Option<String>,
  #[serde(alias = "titleCompanyChosenBy")]
  pub title_company_chosen_by: Option<String>,

  #[serde(alias = "firstTimeHomeBuyer")]
  pub first_time_home_buyer: bool,
  #[serde(alias = "cashPurchase")]
  pub cash_purchase: bool,
  #[serde(alias = "investmentProperty")]
  pub investment_property: bool,
}

impl UserContext {
  /// Business-rule violations in the supplied expectations (empty when valid).
  pub fn validate(&self) -> Vec<String> {
    let mut errors = Vec::new();
    if matches!(self.expected_purchase_price, Some(p) if p <= 0.0) {
      errors.push("Expected purchase price must be positive".to_string());
    }
    if matches!(self.expected_loan_amount, Some(a) if a <= 0.0) {
      errors.push("Expected loan amount must be positive".to_string());
    }
    if matches!(self.expected_interest_rate, Some(r) if !(0.0..=50.0).contains(&r)) {
      errors.push("Expected interest rate must be between 0% and 50%".to_string());
    }
    if let (Some(loan), Some(price)) = (self.expected_loan_amount, self.expected_purchase_price) {
      if loan > price {
        errors.push("Loan amount cannot exceed purchase price".to_string());
      }
    }
    errors
  }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// One finding: the first trigger of one rule against the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
  pub rule: String,
  pub message: String,
  pub snippet: String,
  pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
  Low,
  Moderate,
  High,
}

impl RiskLevel {
  pub fn from_score(forensic_score: u8) -> Self {
    if forensic_score >= 70 {
      Self::Low
    } else if forensic_score >= 30 {
      Self::Moderate
    } else {
      Self::High
    }
  }
}

/// Score and severity histogram derived from a flag list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
  pub forensic_score: u8,
  pub total_flags: usize,
  pub high_severity: usize,
  pub medium_severity: usize,
  pub low_severity: usize,
  pub risk_level: RiskLevel,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
  pub flags: Vec<Flag>,
  pub analytics: Analytics,
  pub rules_digest: String,
}

//! Input checks applied before anything reaches the engine.

use disclosure_engine::UserContext;

use crate::error::ServiceError;

pub const MIN_REPORT_ID_LEN: usize = 10;
const DEFAULT_FILENAME: &str = "document.txt";

pub fn report_id(id: &str) -> Result<&str, ServiceError> {
  let id = id.trim();
  if id.is_empty() {
    return Err(ServiceError::bad_request("Report ID is required"));
  }
  if id.chars().count() < MIN_REPORT_ID_LEN {
    return Err(ServiceError::bad_request("Invalid report ID format"));
  }
  Ok(id)
}

/// Drop NUL bytes, keep at most `max_chars` characters, trim.
pub fn sanitize_text(text: &str, max_chars: usize) -> String {
  let kept: String = text.chars().filter(|&c| c != '\0').take(max_chars).collect();
  kept.trim().to_string()
}

/// Sanitized document text, rejected when nothing is left.
pub fn document_text(text: &str, max_chars: usize) -> Result<String, ServiceError> {
  let text = sanitize_text(text, max_chars);
  if text.is_empty() {
    return Err(ServiceError::bad_request("No text provided for analysis"));
  }
  Ok(text)
}

pub fn filename(name: Option<&str>) -> String {
  name
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .unwrap_or(DEFAULT_FILENAME)
    .to_string()
}

pub fn context(ctx: &UserContext) -> Result<(), ServiceError> {
  let errors = ctx.validate();
  if errors.is_empty() {
    Ok(())
  } else {
    Err(ServiceError::bad_request(errors.join("; ")))
  }
}

//! Primitive helpers shared by every evaluator: pattern compilation, numeric
//! captures, snippets around a match, and message templates.

use regex::{Regex, RegexBuilder};

/// Characters of context kept on each side of a match.
pub const SNIPPET_RADIUS: usize = 50;
pub const NOT_FOUND_SNIPPET: &str = "Pattern not found in document";
pub const MULTIPLE_CONDITIONS_SNIPPET: &str = "Multiple conditions met";

/// Compile a rule pattern. Always case-insensitive; `dot_all` lets `.` span newlines.
pub fn compile(pattern: &str, dot_all: bool) -> Result<Regex, regex::Error> {
  RegexBuilder::new(pattern)
    .case_insensitive(true)
    .dot_matches_new_line(dot_all)
    .build()
}

/// Parse a captured amount, ignoring thousands separators and surrounding space.
pub fn parse_number(raw: &str) -> Option<f64> {
  let cleaned: String = raw.chars().filter(|&c| c != ',').collect();
  cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One regex match: the span of the whole match and the text of group 1, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit<'t> {
  pub start: usize,
  pub end: usize,
  pub value: Option<&'t str>,
}

impl<'t> Hit<'t> {
  fn from_captures(caps: &regex::Captures<'t>) -> Option<Self> {
    let whole = caps.get(0)?;
    Some(Self {
      start: whole.start(),
      end: whole.end(),
      value: caps.get(1).map(|m| m.as_str()),
    })
  }

  /// Group 1 with thousands separators removed, as written in the document.
  pub fn raw_digits(&self) -> Option<String> {
    self.value.map(|v| v.trim().replace(',', ""))
  }
}

pub fn first_hit<'t>(re: &Regex, text: &'t str) -> Option<Hit<'t>> {
  re.captures(text).and_then(|caps| Hit::from_captures(&caps))
}

pub fn all_hits<'a>(re: &'a Regex, text: &'a str) -> impl Iterator<Item = Hit<'a>> + 'a {
  re.captures_iter(text).filter_map(|caps| Hit::from_captures(&caps))
}

/// Bounded, trimmed substring around `[start, end)` extended by `radius`
/// characters on each side. Offsets are byte offsets of a match in `text`.
pub fn snippet(text: &str, start: usize, end: usize, radius: usize) -> String {
  let from = text[..start]
    .char_indices()
    .rev()
    .take(radius)
    .last()
    .map(|(i, _)| i)
    .unwrap_or(start);
  let to = text[end..]
    .char_indices()
    .nth(radius)
    .map(|(i, _)| end + i)
    .unwrap_or(text.len());
  text[from..to].trim().to_string()
}

/// Substitute placeholders in order. List `${key}` before `{key}` so the
/// dollar form wins where both exist.
pub fn render(template: &str, values: &[(&str, String)]) -> String {
  values
    .iter()
    .fold(template.to_string(), |msg, (placeholder, value)| {
      msg.replace(placeholder, value)
    })
}

/// `$1,234.56`
pub fn format_currency(amount: f64) -> String {
  let cents = (amount.abs() * 100.0).round() as u64;
  let whole = (cents / 100).to_string();
  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, ch) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  let sign = if amount < 0.0 { "-" } else { "" };
  format!("{}${}.{:02}", sign, grouped, cents % 100)
}

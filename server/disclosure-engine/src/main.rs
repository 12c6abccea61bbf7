//! Binary entrypoint: read one analysis request from stdin, write the analysis
//! to stdout.
//!
//! The rule file is the first argument, else `RULES_CONFIG_PATH`, else
//! `rules-config.yaml`. Logs go to stderr.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use disclosure_engine::{telemetry, AnalyzeInput, Engine, EngineConfig, RuleSet};

fn main() {
  if let Err(e) = run_binary() {
    let _ = writeln!(io::stderr(), "disclosure-engine error: {}", e);
    std::process::exit(1);
  }
}

fn run_binary() -> Result<(), Box<dyn std::error::Error>> {
  let mut config = EngineConfig::from_env()?;
  if let Some(path) = std::env::args_os().nth(1) {
    config.rules_path = PathBuf::from(path);
  }
  telemetry::init(&config.log_level)?;

  let rules = RuleSet::load(&config.rules_path)?;
  let engine = Engine::new(rules, config.scoring);

  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let input: AnalyzeInput = serde_json::from_str(&raw)?;

  let analysis = engine.analyze(&input.text, input.context.as_ref());
  let json = serde_json::to_vec(&analysis)?;
  let mut out = io::stdout().lock();
  out.write_all(&json)?;
  writeln!(out)?;
  Ok(())
}

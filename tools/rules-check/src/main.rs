//! rules-check: lint and dry-run rule files before deploying them
//!
//! Usage:
//!   rules-check summary  [rules.yaml]                 # counts by type and state
//!   rules-check validate [rules.yaml] [-q]            # exit 1 if any rule is unusable
//!   rules-check run      [rules.yaml] --text cd.txt   # analyze a text file
//!                        [--context ctx.json] [--json]
//!
//! The rule file defaults to `RULES_CONFIG_PATH`, then `rules-config.yaml`.
//! Exit code 2 means the rule file or an input could not be read at all.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use disclosure_engine::{Analysis, Engine, EngineConfig, RuleSet, UserContext};

#[derive(Parser, Debug)]
#[command(name = "rules-check", about = "Lint and dry-run disclosure rule files", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print rule counts by type and enabled state
    Summary(RulesArg),
    /// Report unusable rules (errors) and suspicious ones (warnings)
    Validate {
        #[command(flatten)]
        rules: RulesArg,
        /// Quiet: only exit code (0=valid, 1=invalid)
        #[arg(short, long)]
        quiet: bool,
    },
    /// Run the rule file against a document text file
    Run {
        #[command(flatten)]
        rules: RulesArg,
        /// Extracted document text
        #[arg(long)]
        text: PathBuf,
        /// Buyer context as JSON
        #[arg(long)]
        context: Option<PathBuf>,
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct RulesArg {
    /// Rule file (YAML, or JSON by extension)
    rules: Option<PathBuf>,
}

impl RulesArg {
    fn load(&self, config: &EngineConfig) -> RuleSet {
        let path = self.rules.as_deref().unwrap_or(&config.rules_path);
        RuleSet::load(path).unwrap_or_else(|e| fail(format!("cannot load rules: {}", e)))
    }
}

fn fail(message: String) -> ! {
    eprintln!("rules-check: {}", message);
    process::exit(2);
}

fn read(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path.display(), e)))
}

fn print_summary(set: &RuleSet) {
    let summary = set.summary();
    println!("rules:    {}", summary.total_rules);
    println!("enabled:  {}", summary.enabled_rules);
    println!("disabled: {}", summary.disabled_rules);
    println!("skipped:  {}", summary.skipped_rules);
    println!("digest:   {}", set.digest());
    for (kind, count) in &summary.rule_types {
        println!("  {:<24} {}", kind, count);
    }
}

/// Exit code for a validation run.
fn print_validation(set: &RuleSet, quiet: bool) -> i32 {
    let validation = set.validate();
    if !quiet {
        for e in &validation.errors {
            println!("error: {}", e);
        }
        for w in &validation.warnings {
            println!("warning: {}", w);
        }
        if validation.valid {
            println!("{} rules OK.", set.len());
        }
    }
    if validation.valid {
        0
    } else {
        1
    }
}

fn print_analysis(analysis: &Analysis) {
    if analysis.flags.is_empty() {
        println!("No flags.");
    }
    for flag in &analysis.flags {
        println!("[{:?}] {}: {}", flag.severity, flag.rule, flag.message);
        println!("    {}", flag.snippet);
    }
    let a = &analysis.analytics;
    println!(
        "score {} ({:?}) - {} flags: {} high, {} medium, {} low",
        a.forensic_score, a.risk_level, a.total_flags, a.high_severity, a.medium_severity, a.low_severity
    );
}

fn main() {
    let cli = Cli::parse();
    let config = EngineConfig::from_env().unwrap_or_else(|e| fail(e.to_string()));

    let code = match cli.command {
        Command::Summary(rules) => {
            print_summary(&rules.load(&config));
            0
        }
        Command::Validate { rules, quiet } => print_validation(&rules.load(&config), quiet),
        Command::Run {
            rules,
            text,
            context,
            json,
        } => {
            let engine = Engine::new(rules.load(&config), config.scoring);
            let text = read(&text);
            let context: Option<UserContext> = context.map(|path| {
                serde_json::from_str(&read(&path))
                    .unwrap_or_else(|e| fail(format!("invalid context JSON in {}: {}", path.display(), e)))
            });
            let analysis = engine.analyze(&text, context.as_ref());
            if json {
                match serde_json::to_string_pretty(&analysis) {
                    Ok(out) => println!("{}", out),
                    Err(e) => fail(e.to_string()),
                }
            } else {
                print_analysis(&analysis);
            }
            0
        }
    };
    process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_requires_text() {
        assert!(Cli::try_parse_from(["rules-check", "run", "rules.yaml"]).is_err());
        let cli = Cli::try_parse_from(["rules-check", "run", "rules.yaml", "--text", "cd.txt"]).unwrap();
        match cli.command {
            Command::Run { rules, text, json, .. } => {
                assert_eq!(rules.rules, Some(PathBuf::from("rules.yaml")));
                assert_eq!(text, PathBuf::from("cd.txt"));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn validation_exit_codes() {
        let good = RuleSet::from_yaml_str("- {name: a, type: regex_presence, pattern: x, message: m}").unwrap();
        assert_eq!(print_validation(&good, true), 0);
        let bad = RuleSet::from_yaml_str("- {name: a, type: nope, message: m}").unwrap();
        assert_eq!(print_validation(&bad, true), 1);
    }
}

//! Evaluation results and their output formats.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output, violations grouped by severity
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::rules::{Severity, Violation, ViolationRule};
use crate::score::{CategoryPenalty, ComplianceScore, Rating};

/// Result of evaluating one document: the score and every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub score: i32,
    pub violations: Vec<Violation>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    /// Gate decision. Without a minimum score any violation fails.
    pub fn passed(&self, min_score: Option<i32>) -> bool {
        match min_score {
            Some(min) => self.score >= min,
            None => self.violations.is_empty(),
        }
    }
}

/// A report together with everything the output surfaces show about it.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Where the document came from (file path or a label).
    pub source: String,
    pub report: Report,
    pub compliance: ComplianceScore,
    pub min_score: Option<i32>,
}

impl Evaluation {
    pub fn new(
        source: impl Into<String>,
        violations: Vec<Violation>,
        compliance: ComplianceScore,
        min_score: Option<i32>,
    ) -> Self {
        Self {
            source: source.into(),
            report: Report {
                score: compliance.score,
                violations,
            },
            compliance,
            min_score,
        }
    }

    pub fn passed(&self) -> bool {
        self.report.passed(self.min_score)
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report for one document.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub source: String,
    pub score: i32,
    pub rating: Rating,
    pub total_apis: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub passed: bool,
    pub violations: Vec<Violation>,
    pub breakdown: Vec<CategoryPenalty>,
}

impl From<&Evaluation> for JsonReport {
    fn from(eval: &Evaluation) -> Self {
        JsonReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            source: eval.source.clone(),
            score: eval.report.score,
            rating: eval.compliance.rating,
            total_apis: eval.compliance.total_apis,
            error_count: eval.report.error_count(),
            warning_count: eval.report.warning_count(),
            passed: eval.passed(),
            violations: eval.report.violations.clone(),
            breakdown: eval.compliance.breakdown.clone(),
        }
    }
}

/// Render evaluations as JSON: an object for one document, an array otherwise.
pub fn render_json(evaluations: &[Evaluation]) -> anyhow::Result<String> {
    let reports: Vec<JsonReport> = evaluations.iter().map(JsonReport::from).collect();
    let json = match reports.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(&reports)?,
    };
    Ok(json)
}

/// Write results in JSON format.
pub fn write_json(evaluations: &[Evaluation]) -> anyhow::Result<()> {
    println!("{}", render_json(evaluations)?);
    Ok(())
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "apigov";
const INFO_URI: &str = "https://github.com/zen-systems/apigov";

#[derive(Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    #[serde(rename = "informationUri")]
    pub information_uri: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
    #[serde(rename = "helpUri")]
    pub help_uri: String,
    pub properties: SarifRuleProperties,
    #[serde(rename = "defaultConfiguration")]
    pub default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRuleProperties {
    pub category: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifRuleConfig {
    pub level: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations")]
    pub logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifact,
}

#[derive(Serialize, Deserialize)]
pub struct SarifArtifact {
    pub uri: String,
}

#[derive(Serialize, Deserialize)]
pub struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    pub fully_qualified_name: String,
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

/// `METHOD path` for operation findings, the bare path otherwise.
fn logical_name(v: &Violation) -> String {
    match &v.method {
        Some(method) => format!("{} {}", method.to_uppercase(), v.path),
        None => v.path.clone(),
    }
}

fn sarif_message(v: &Violation) -> String {
    match &v.status_code {
        Some(code) => format!("{} (status {})", v.message, code),
        None => v.message.clone(),
    }
}

fn sarif_rule(rule: ViolationRule) -> SarifRule {
    SarifRule {
        id: rule.as_str().to_string(),
        short_description: SarifMessage {
            text: rule.description().to_string(),
        },
        help_uri: format!("{}#{}", INFO_URI, rule.as_str().replace('_', "-")),
        properties: SarifRuleProperties {
            category: rule.category().as_str().to_string(),
        },
        default_config: SarifRuleConfig {
            level: map_severity_to_level(rule.severity()).to_string(),
        },
    }
}

/// Build a single-run SARIF log covering every evaluated document.
pub fn build_sarif(evaluations: &[Evaluation]) -> SarifReport {
    let rule_set: BTreeSet<ViolationRule> = evaluations
        .iter()
        .flat_map(|e| e.report.violations.iter().map(|v| v.rule))
        .collect();

    let rules = rule_set.into_iter().map(sarif_rule).collect();

    let results = evaluations
        .iter()
        .flat_map(|eval| {
            eval.report.violations.iter().map(move |v| SarifResult {
                rule_id: v.rule.as_str().to_string(),
                level: map_severity_to_level(v.severity).to_string(),
                message: SarifMessage {
                    text: sarif_message(v),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifact {
                            uri: eval.source.replace('\\', "/"),
                        },
                    },
                    logical_locations: vec![SarifLogicalLocation {
                        fully_qualified_name: logical_name(v),
                    }],
                }],
            })
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: INFO_URI.to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

pub fn render_sarif(evaluations: &[Evaluation]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&build_sarif(evaluations))?)
}

/// Write results in SARIF format.
pub fn write_sarif(evaluations: &[Evaluation]) -> anyhow::Result<()> {
    println!("{}", render_sarif(evaluations)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(evaluations: &[Evaluation], policy_name: &str) {
    // Header
    println!();
    print!("  ");
    print!("{}", "apigov".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Policy:   ".dimmed());
    println!("{}", policy_name);

    for eval in evaluations {
        println!();
        write_document(eval);
    }

    if evaluations.len() > 1 {
        let passed = evaluations.iter().filter(|e| e.passed()).count();
        println!(
            "  {}",
            format!("{} of {} documents passed", passed, evaluations.len()).bold()
        );
        println!();
    }
}

fn write_document(eval: &Evaluation) {
    print!("  {}", "Document: ".dimmed());
    println!("{}", eval.source);
    println!();

    write_result_summary(eval);
    println!();

    if !eval.report.violations.is_empty() {
        write_violations(&eval.report.violations);
    }

    if !eval.compliance.breakdown.is_empty() {
        write_breakdown(&eval.compliance);
        println!();
    }

    write_final_status(eval);
    println!();
}

fn write_result_summary(eval: &Evaluation) {
    if eval.passed() {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }

    print!("  Compliance: ");
    write_colored_score(eval.report.score, eval.compliance.rating);
    print!("/100  Rating: ");
    write_colored_rating(eval.compliance.rating);
    print!(
        "  {}",
        format!(
            "({} errors, {} warnings)",
            eval.report.error_count(),
            eval.report.warning_count()
        )
        .dimmed()
    );
    println!();
}

fn write_colored_score(score: i32, rating: Rating) {
    match rating {
        Rating::Good => print!("{}", score.to_string().green().bold()),
        Rating::Fair => print!("{}", score.to_string().yellow()),
        Rating::Poor => print!("{}", score.to_string().red()),
    }
}

fn write_colored_rating(rating: Rating) {
    match rating {
        Rating::Good => print!("{}", rating.as_str().green()),
        Rating::Fair => print!("{}", rating.as_str().yellow()),
        Rating::Poor => print!("{}", rating.as_str().red()),
    }
}

fn write_violations(violations: &[Violation]) {
    for (severity, title) in [(Severity::Error, "Errors"), (Severity::Warning, "Warnings")] {
        let group: Vec<&Violation> = violations.iter().filter(|v| v.severity == severity).collect();
        if group.is_empty() {
            continue;
        }

        println!("  {} ({}):", title.bold(), group.len());
        println!();

        for v in group {
            write_severity_tag(severity);
            print!("   ");
            print!("{:<30}", v.rule.as_str().dimmed());
            print!("{}", logical_name(v).blue());
            if let Some(code) = &v.status_code {
                print!("{}", format!(" [{}]", code).dimmed());
            }
            println!();

            // Message on next line, indented
            println!("            {}", v.message);
            println!();
        }
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
    }
}

fn write_breakdown(compliance: &ComplianceScore) {
    println!("  {}", "Breakdown:".bold());

    for entry in &compliance.breakdown {
        println!(
            "    {:<12} -{:>5.1} of {:>4.1}  ({} errors, {} warnings)",
            entry.category.as_str(),
            entry.penalty,
            entry.weight,
            entry.errors,
            entry.warnings
        );
    }
}

fn write_final_status(eval: &Evaluation) {
    if let Some(min) = eval.min_score {
        print!("  {}", format!("Minimum: {}", min).dimmed());
    } else {
        print!("  {}", "Minimum: no violations".dimmed());
    }
    print!("  Score: ");
    write_colored_score(eval.report.score, eval.compliance.rating);
    print!("  ");

    if eval.passed() {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
}

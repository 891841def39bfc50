//! apigov - OpenAPI governance gate.
//!
//! apigov reviews an OpenAPI document against a fixed set of governance
//! rules and summarizes the result as a compliance score from 0 to 100.
//! Missing structure is reported as a violation, never as an error: the
//! engine always runs to completion on a loadable document.
//!
//! # Architecture
//!
//! - `document`: lenient serde model of the OpenAPI document
//! - `rules`: the governance checks and the `Runner` that aggregates them
//! - `score`: weighted, per-category capped scoring
//! - `policy`: YAML policy schema (weights, normalization, pass threshold)
//! - `report`: the `Report` record and output formatting (pretty, JSON, SARIF)
//!
//! # Adding a New Rule
//!
//! Implement `GovernanceRule` and pass it to `Runner::with_rules`, or
//! register it in `Runner::new` to make it part of the default set.

pub mod cli;
pub mod document;
pub mod policy;
pub mod report;
pub mod rules;
pub mod score;

pub use document::{ApiDocument, DocumentError};
pub use policy::{Policy, ScoringPolicy};
pub use report::Report;
pub use rules::{Category, GovernanceRule, Runner, Severity, Violation, ViolationRule};
pub use score::ComplianceScore;

/// Evaluate a document with the default rules and weights, normalized
/// to a single API.
pub fn evaluate(doc: &ApiDocument) -> Report {
    Runner::new().evaluate(doc, &ScoringPolicy::default(), 1)
}

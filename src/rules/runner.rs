//! Aggregator that runs every governance check over one document.

use rayon::prelude::*;
use tracing::debug;

use crate::document::ApiDocument;
use crate::policy::ScoringPolicy;
use crate::report::Report;
use crate::score;

use super::{GovernanceRule, InfoRule, NamingRule, ResponsesRule, SecurityRule, Violation};

/// Executes an ordered set of governance checks against a document.
pub struct Runner {
    rules: Vec<Box<dyn GovernanceRule>>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Create a runner with the built-in checks: info, naming, responses, security.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(InfoRule),
                Box::new(NamingRule),
                Box::new(ResponsesRule),
                Box::new(SecurityRule),
            ],
        }
    }

    /// Create a runner with a custom set of checks, run in the given order.
    pub fn with_rules(rules: Vec<Box<dyn GovernanceRule>>) -> Self {
        Self { rules }
    }

    /// Names of the registered checks, in execution order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every check sequentially and concatenate the findings.
    pub fn run(&self, doc: &ApiDocument) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in &self.rules {
            violations.extend(run_rule(rule.as_ref(), doc));
        }
        violations
    }

    /// Run the checks on the rayon pool.
    ///
    /// Output order matches [`Runner::run`]: per-check results are
    /// collected in registration order before being flattened.
    pub fn run_parallel(&self, doc: &ApiDocument) -> Vec<Violation> {
        let per_rule: Vec<Vec<Violation>> = self
            .rules
            .par_iter()
            .map(|rule| run_rule(rule.as_ref(), doc))
            .collect();

        per_rule.into_iter().flatten().collect()
    }

    /// Run all checks and score the result.
    pub fn evaluate(&self, doc: &ApiDocument, scoring: &ScoringPolicy, total_apis: usize) -> Report {
        let violations = self.run(doc);
        let compliance = score::calculate(&violations, total_apis, scoring);
        Report {
            score: compliance.score,
            violations,
        }
    }
}

fn run_rule(rule: &dyn GovernanceRule, doc: &ApiDocument) -> Vec<Violation> {
    let found = rule.check(doc);
    debug!(rule = rule.name(), count = found.len(), "rule check finished");
    debug_assert!(
        found.iter().all(|v| v.category == rule.category()),
        "rule {} emitted a violation outside category {}",
        rule.name(),
        rule.category()
    );
    found
}

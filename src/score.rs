//! Compliance scoring.
//!
//! Calculates a compliance score (0-100, higher is better) from violation
//! counts. Each category accumulates a severity-weighted penalty that is
//! capped at the category's weight, so no single category can drive the
//! score below zero on its own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::policy::ScoringPolicy;
use crate::rules::{Category, Severity, Violation};

/// Default scoring parameters.
pub mod defaults {
    pub const SECURITY_WEIGHT: f64 = 30.0;
    pub const RESPONSES_WEIGHT: f64 = 25.0;
    pub const NAMING_WEIGHT: f64 = 20.0;
    pub const VERSIONING_WEIGHT: f64 = 15.0;
    pub const OTHER_WEIGHT: f64 = 10.0;

    pub const ERROR_FACTOR: f64 = 1.5;
    pub const WARNING_FACTOR: f64 = 1.0;
    pub const SENSITIVITY: f64 = 10.0;
}

/// Rating bands.
pub mod bands {
    pub const GOOD_MIN: i32 = 80;
    pub const FAIR_MIN: i32 = 50;
}

/// Coarse rating of a compliance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Fair,
    Poor,
}

impl Rating {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= bands::GOOD_MIN => Rating::Good,
            s if s >= bands::FAIR_MIN => Rating::Fair,
            _ => Rating::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::Fair => "fair",
            Rating::Poor => "poor",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Penalty contributed by one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPenalty {
    pub category: Category,
    pub errors: usize,
    pub warnings: usize,
    pub weight: f64,
    pub penalty: f64,
}

/// The calculated compliance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceScore {
    /// Score from 0-100, higher = more compliant
    pub score: i32,
    pub rating: Rating,
    /// Denominator the counts were normalized by
    pub total_apis: usize,
    /// Penalties by category, in category order
    pub breakdown: Vec<CategoryPenalty>,
}

impl ComplianceScore {
    /// Sum of all category penalties before rounding.
    pub fn total_penalty(&self) -> f64 {
        self.breakdown.iter().map(|c| c.penalty).sum()
    }

    /// Penalty entry for a category, if it had any violations.
    pub fn category(&self, category: Category) -> Option<&CategoryPenalty> {
        self.breakdown.iter().find(|c| c.category == category)
    }
}

/// Calculate the compliance score for a set of violations.
///
/// `total_apis` normalizes the counts (number of operations or documents
/// being scored); zero is treated as one. The result depends only on the
/// per-category error and warning counts, never on violation order.
pub fn calculate(
    violations: &[Violation],
    total_apis: usize,
    scoring: &ScoringPolicy,
) -> ComplianceScore {
    let total_apis = total_apis.max(1);
    let denominator = total_apis as f64;

    let mut counts: BTreeMap<Category, (usize, usize)> = BTreeMap::new();
    for v in violations {
        let entry = counts.entry(v.category).or_insert((0, 0));
        match v.severity {
            Severity::Error => entry.0 += 1,
            Severity::Warning => entry.1 += 1,
        }
    }

    let breakdown: Vec<CategoryPenalty> = counts
        .into_iter()
        .map(|(category, (errors, warnings))| {
            let weight = scoring.weights.weight_for(category);
            let multiplier = (errors as f64 * scoring.error_factor
                + warnings as f64 * scoring.warning_factor)
                / denominator;
            CategoryPenalty {
                category,
                errors,
                warnings,
                weight,
                penalty: (multiplier * scoring.sensitivity).min(weight),
            }
        })
        .collect();

    let total_penalty: f64 = breakdown.iter().map(|c| c.penalty).sum();
    let score = (100.0 - total_penalty).round().clamp(0.0, 100.0) as i32;

    ComplianceScore {
        score,
        rating: Rating::from_score(score),
        total_apis,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ViolationRule;

    fn make_violation(category: Category, severity: Severity) -> Violation {
        Violation::new(category, ViolationRule::MissingTitle, severity, "root", "test")
    }

    fn repeat(category: Category, severity: Severity, n: usize) -> Vec<Violation> {
        (0..n).map(|_| make_violation(category, severity)).collect()
    }

    #[test]
    fn test_no_violations_scores_100() {
        let score = calculate(&[], 1, &ScoringPolicy::default());
        assert_eq!(score.score, 100);
        assert_eq!(score.rating, Rating::Good);
        assert!(score.breakdown.is_empty());
    }

    #[test]
    fn test_single_category_penalty() {
        // 2 errors + 1 warning = 4.0, * 10 = 40, capped at 30
        let mut violations = repeat(Category::Security, Severity::Error, 2);
        violations.extend(repeat(Category::Security, Severity::Warning, 1));

        let score = calculate(&violations, 1, &ScoringPolicy::default());
        assert_eq!(score.score, 70);
        let security = score.category(Category::Security).unwrap();
        assert_eq!(security.errors, 2);
        assert_eq!(security.warnings, 1);
        assert_eq!(security.penalty, 30.0);
    }

    #[test]
    fn test_uncapped_penalty() {
        // One naming warning = 1.0 * 10 = 10 (< 20)
        let violations = repeat(Category::Naming, Severity::Warning, 1);
        let score = calculate(&violations, 1, &ScoringPolicy::default());
        assert_eq!(score.score, 90);
    }

    #[test]
    fn test_normalization_by_total_apis() {
        // 1 error over 4 APIs = 0.375 * 10 = 3.75 -> 96.25 -> 96
        let violations = repeat(Category::Responses, Severity::Error, 1);
        let score = calculate(&violations, 4, &ScoringPolicy::default());
        assert_eq!(score.score, 96);
        assert_eq!(score.total_apis, 4);
    }

    #[test]
    fn test_zero_total_apis_treated_as_one() {
        let violations = repeat(Category::Naming, Severity::Warning, 1);
        let zero = calculate(&violations, 0, &ScoringPolicy::default());
        let one = calculate(&violations, 1, &ScoringPolicy::default());
        assert_eq!(zero.score, one.score);
        assert_eq!(zero.total_apis, 1);
    }

    #[test]
    fn test_every_category_saturated_scores_zero() {
        let mut violations = Vec::new();
        for category in Category::ALL {
            violations.extend(repeat(category, Severity::Error, 50));
        }
        let score = calculate(&violations, 1, &ScoringPolicy::default());
        assert_eq!(score.score, 0);
        assert_eq!(score.rating, Rating::Poor);
        assert_eq!(score.total_penalty(), 100.0);
    }

    #[test]
    fn test_other_category_uses_default_weight() {
        let violations = repeat(Category::Other, Severity::Error, 10);
        let score = calculate(&violations, 1, &ScoringPolicy::default());
        assert_eq!(score.score, 90);
    }

    #[test]
    fn test_custom_weights() {
        let mut scoring = ScoringPolicy::default();
        scoring.weights.naming = 5.0;
        let violations = repeat(Category::Naming, Severity::Warning, 3);
        let score = calculate(&violations, 1, &scoring);
        assert_eq!(score.score, 95);
    }

    #[test]
    fn test_additional_error_never_raises_score() {
        let scoring = ScoringPolicy::default();
        for category in Category::ALL {
            let mut violations = Vec::new();
            let mut previous = calculate(&violations, 3, &scoring).score;
            for _ in 0..40 {
                violations.push(make_violation(category, Severity::Error));
                let current = calculate(&violations, 3, &scoring).score;
                assert!(current <= previous, "{} went up", category);
                assert!((0..=100).contains(&current));
                previous = current;
            }
        }
    }

    #[test]
    fn test_order_independent() {
        let mut violations = repeat(Category::Security, Severity::Error, 1);
        violations.extend(repeat(Category::Naming, Severity::Warning, 2));
        violations.extend(repeat(Category::Responses, Severity::Error, 1));

        let forward = calculate(&violations, 2, &ScoringPolicy::default());
        violations.reverse();
        let backward = calculate(&violations, 2, &ScoringPolicy::default());
        assert_eq!(forward.score, backward.score);
        assert_eq!(forward.breakdown, backward.breakdown);
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(Rating::from_score(100), Rating::Good);
        assert_eq!(Rating::from_score(80), Rating::Good);
        assert_eq!(Rating::from_score(79), Rating::Fair);
        assert_eq!(Rating::from_score(50), Rating::Fair);
        assert_eq!(Rating::from_score(49), Rating::Poor);
        assert_eq!(Rating::from_score(0), Rating::Poor);
    }
}

//! Governance policy definitions.
//!
//! A policy tunes how violations turn into a score: category weights,
//! severity factors, the sensitivity constant and the normalization
//! denominator. The rules themselves are fixed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::document::ApiDocument;
use crate::rules::Category;
use crate::score::defaults;

/// Top-level policy definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Policy {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Normalization denominator for scoring (default: 1)
    #[serde(default = "default_total_apis")]
    pub total_apis: usize,
    /// Use each document's operation count as the denominator instead
    #[serde(default)]
    pub normalize_by_operations: bool,
    /// Minimum passing score; without it any violation fails the gate
    #[serde(default)]
    pub min_score: Option<i32>,
    #[serde(default)]
    pub scoring: ScoringPolicy,
}

fn default_total_apis() -> usize {
    1
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            name: "default".to_string(),
            description: None,
            total_apis: default_total_apis(),
            normalize_by_operations: false,
            min_score: None,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl Policy {
    /// Parse a policy from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let policy: Policy = serde_yaml::from_str(&content)?;
        Ok(policy)
    }

    /// The scoring denominator to use for a given document.
    pub fn total_apis_for(&self, doc: &ApiDocument) -> usize {
        if self.normalize_by_operations {
            doc.operation_count().max(1)
        } else {
            self.total_apis.max(1)
        }
    }
}

/// Tunables of the scoring formula.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringPolicy {
    #[serde(default)]
    pub weights: CategoryWeights,
    /// Multiplier applied to the per-category severity sum (default: 10)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Weight of one error relative to one warning (default: 1.5)
    #[serde(default = "default_error_factor")]
    pub error_factor: f64,
    #[serde(default = "default_warning_factor")]
    pub warning_factor: f64,
}

fn default_sensitivity() -> f64 {
    defaults::SENSITIVITY
}

fn default_error_factor() -> f64 {
    defaults::ERROR_FACTOR
}

fn default_warning_factor() -> f64 {
    defaults::WARNING_FACTOR
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            sensitivity: default_sensitivity(),
            error_factor: default_error_factor(),
            warning_factor: default_warning_factor(),
        }
    }
}

/// Maximum penalty each category can contribute.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryWeights {
    #[serde(default = "weight_security")]
    pub security: f64,
    #[serde(default = "weight_responses")]
    pub responses: f64,
    #[serde(default = "weight_naming")]
    pub naming: f64,
    #[serde(default = "weight_versioning")]
    pub versioning: f64,
    #[serde(default = "weight_other")]
    pub other: f64,
}

fn weight_security() -> f64 {
    defaults::SECURITY_WEIGHT
}

fn weight_responses() -> f64 {
    defaults::RESPONSES_WEIGHT
}

fn weight_naming() -> f64 {
    defaults::NAMING_WEIGHT
}

fn weight_versioning() -> f64 {
    defaults::VERSIONING_WEIGHT
}

fn weight_other() -> f64 {
    defaults::OTHER_WEIGHT
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            security: weight_security(),
            responses: weight_responses(),
            naming: weight_naming(),
            versioning: weight_versioning(),
            other: weight_other(),
        }
    }
}

impl CategoryWeights {
    pub fn weight_for(&self, category: Category) -> f64 {
        match category {
            Category::Security => self.security,
            Category::Responses => self.responses,
            Category::Naming => self.naming,
            Category::Versioning => self.versioning,
            Category::Other => self.other,
        }
    }
}

/// Validate a policy for correctness.
pub fn validate(policy: &Policy) -> anyhow::Result<()> {
    if policy.total_apis == 0 {
        anyhow::bail!("total_apis must be at least 1");
    }

    if let Some(min) = policy.min_score {
        if !(0..=100).contains(&min) {
            anyhow::bail!("min_score {} must be between 0 and 100", min);
        }
    }

    let scoring = &policy.scoring;
    for category in Category::ALL {
        let weight = scoring.weights.weight_for(category);
        if !weight.is_finite() || weight < 0.0 {
            anyhow::bail!("invalid weight {} for category {:?}", weight, category.as_str());
        }
    }

    for (name, value) in [
        ("sensitivity", scoring.sensitivity),
        ("error_factor", scoring.error_factor),
        ("warning_factor", scoring.warning_factor),
    ] {
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("invalid {} {}, must be a non-negative number", name, value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        let yaml = r#"
version: "1"
name: "Strict security"
total_apis: 4
min_score: 85
scoring:
  weights:
    security: 40
    naming: 10
"#;
        let policy: Policy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.name, "Strict security");
        assert_eq!(policy.total_apis, 4);
        assert_eq!(policy.min_score, Some(85));
        assert_eq!(policy.scoring.weights.security, 40.0);
        assert_eq!(policy.scoring.weights.naming, 10.0);
        // Unspecified values keep their defaults
        assert_eq!(policy.scoring.weights.responses, 25.0);
        assert_eq!(policy.scoring.weights.other, 10.0);
        assert_eq!(policy.scoring.sensitivity, 10.0);
        assert_eq!(policy.scoring.error_factor, 1.5);
        assert!(validate(&policy).is_ok());
    }

    #[test]
    fn test_empty_policy_uses_defaults() {
        let policy: Policy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(policy.total_apis, 1);
        assert!(!policy.normalize_by_operations);
        assert_eq!(policy.scoring.weights.security, 30.0);
        assert_eq!(policy.scoring.weights.versioning, 15.0);
        assert!(validate(&policy).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let policy = Policy {
            total_apis: 0,
            ..Default::default()
        };
        assert!(validate(&policy).is_err());

        let policy = Policy {
            min_score: Some(101),
            ..Default::default()
        };
        assert!(validate(&policy).is_err());

        let mut policy = Policy::default();
        policy.scoring.weights.naming = -5.0;
        assert!(validate(&policy).is_err());

        let mut policy = Policy::default();
        policy.scoring.sensitivity = f64::NAN;
        assert!(validate(&policy).is_err());
    }

    #[test]
    fn test_total_apis_per_operation() {
        let doc: ApiDocument = serde_json::from_value(serde_json::json!({
            "paths": {"/api/users": {"get": {}, "post": {}}, "/api/orders": {"get": {}}}
        }))
        .unwrap();

        let policy = Policy::default();
        assert_eq!(policy.total_apis_for(&doc), 1);

        let policy = Policy {
            normalize_by_operations: true,
            ..Default::default()
        };
        assert_eq!(policy.total_apis_for(&doc), 3);
        assert_eq!(policy.total_apis_for(&ApiDocument::default()), 1);
    }

    #[test]
    fn test_bundled_templates_are_valid() {
        for content in [
            include_str!("templates/default.yaml"),
            include_str!("templates/security-first.yaml"),
        ] {
            let policy: Policy = serde_yaml::from_str(content).unwrap();
            assert!(validate(&policy).is_ok(), "{}", policy.name);
        }
    }
}

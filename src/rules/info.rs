//! Checks on the `info` block: title, description and version.

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::ApiDocument;

use super::{Category, GovernanceRule, Severity, Violation, ViolationRule};

/// Descriptions shorter than this are flagged.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

lazy_static! {
    /// MAJOR.MINOR.PATCH with no prerelease or build suffix.
    static ref SEMVER_PATTERN: Regex = Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").unwrap();
}

/// Validates the document's `info` block.
#[derive(Debug, Default, Clone, Copy)]
pub struct InfoRule;

impl GovernanceRule for InfoRule {
    fn name(&self) -> &'static str {
        "info"
    }

    fn category(&self) -> Category {
        Category::Versioning
    }

    fn check(&self, doc: &ApiDocument) -> Vec<Violation> {
        let mut violations = Vec::new();

        let Some(info) = &doc.info else {
            violations.push(violation(
                ViolationRule::MissingInfo,
                "root",
                "missing \"info\" object",
            ));
            return violations;
        };

        if info.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            violations.push(violation(
                ViolationRule::MissingTitle,
                "info.title",
                "API title is missing or empty",
            ));
        }

        match info.description.as_deref() {
            None => violations.push(violation(
                ViolationRule::ShortDescription,
                "info.description",
                "API description is missing",
            )),
            Some(desc) => {
                let len = desc.chars().count();
                if len < MIN_DESCRIPTION_CHARS {
                    violations.push(violation(
                        ViolationRule::ShortDescription,
                        "info.description",
                        format!(
                            "API description {:?} is too short ({} characters, minimum {})",
                            desc, len, MIN_DESCRIPTION_CHARS
                        ),
                    ));
                }
            }
        }

        match info.version.as_deref() {
            None | Some("") => violations.push(violation(
                ViolationRule::MissingVersion,
                "info.version",
                "API version is missing",
            )),
            Some(version) if !SEMVER_PATTERN.is_match(version) => violations.push(violation(
                ViolationRule::NonSemverVersion,
                "info.version",
                format!(
                    "version {:?} should follow semantic versioning (MAJOR.MINOR.PATCH, e.g. 1.0.0)",
                    version
                ),
            )),
            Some(_) => {}
        }

        violations
    }
}

fn violation(rule: ViolationRule, path: &str, message: impl Into<String>) -> Violation {
    Violation::new(Category::Versioning, rule, rule.severity(), path, message)
}

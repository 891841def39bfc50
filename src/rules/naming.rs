//! Naming conventions for paths and operation identifiers.
//!
//! These are heuristics, so almost everything here is a warning. The one
//! exception is a missing `operationId`: client generators depend on it.

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::{ApiDocument, HttpMethod, Operation};

use super::{Category, GovernanceRule, Violation, ViolationRule};

/// Every path is expected to live under this prefix.
pub const API_PREFIX: &str = "/api";

lazy_static! {
    /// Verb-like segments, optionally pluralized.
    static ref VERB_SEGMENT: Regex =
        Regex::new(r"(?i)^(get|create|update|delete|add|remove|post|put|patch)s?$").unwrap();

    /// Lowercase words joined by single underscores.
    static ref OPERATION_ID: Regex = Regex::new(r"^[a-z]+(_[a-z]+)*$").unwrap();
}

/// Path and operationId naming conventions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamingRule;

impl GovernanceRule for NamingRule {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn category(&self) -> Category {
        Category::Naming
    }

    fn check(&self, doc: &ApiDocument) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (path, item) in doc.paths.iter().flatten() {
            check_path(path, &mut violations);

            for (method, operation) in item.operations() {
                check_operation_id(path, method, operation, &mut violations);
            }
        }

        violations
    }
}

/// `{id}`-style placeholder.
fn is_parameter(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}')
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn check_path(path: &str, violations: &mut Vec<Violation>) {
    if !path.starts_with(API_PREFIX) {
        violations.push(warning(
            ViolationRule::MissingApiPrefix,
            path,
            format!("path {:?} should start with {}", path, API_PREFIX),
        ));
    }

    if path.chars().any(char::is_uppercase) {
        violations.push(warning(
            ViolationRule::UppercasePath,
            path,
            format!("path {:?} should be lowercase", path),
        ));
    }

    if path.contains('_') {
        violations.push(warning(
            ViolationRule::UnderscorePath,
            path,
            format!(
                "path {:?} should use hyphens instead of underscores",
                path
            ),
        ));
    }

    if path.len() > 1 && path.ends_with('/') {
        violations.push(warning(
            ViolationRule::TrailingSlash,
            path,
            format!("path {:?} should not have a trailing slash", path),
        ));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for segment in segments.iter().filter(|s| !is_parameter(s)) {
        if VERB_SEGMENT.is_match(segment) {
            violations.push(warning(
                ViolationRule::VerbSegment,
                path,
                format!(
                    "path segment {:?} looks like a verb; paths should use nouns, not verbs",
                    segment
                ),
            ));
        }
    }

    if let Some(last) = segments.last() {
        if !is_parameter(last) && !last.ends_with('s') {
            violations.push(warning(
                ViolationRule::SingularCollection,
                path,
                format!("path segment {:?} should be plural for collections", last),
            ));
        }
    }

    for pair in segments.windows(2) {
        let (anchor, next) = (pair[0], pair[1]);
        if (is_parameter(anchor) || is_numeric(anchor)) && !next.ends_with('s') {
            violations.push(warning(
                ViolationRule::UnclearHierarchy,
                path,
                format!(
                    "path hierarchy may not be clear: expected a plural noun after {:?} but found {:?}",
                    anchor, next
                ),
            ));
        }
    }
}

fn check_operation_id(
    path: &str,
    method: HttpMethod,
    operation: &Operation,
    violations: &mut Vec<Violation>,
) {
    match operation.operation_id.as_deref() {
        None | Some("") => violations.push(
            Violation::new(
                Category::Naming,
                ViolationRule::MissingOperationId,
                ViolationRule::MissingOperationId.severity(),
                path,
                format!("{} {} is missing an operationId", method.as_str().to_uppercase(), path),
            )
            .with_method(method),
        ),
        Some(id) if !OPERATION_ID.is_match(id) => violations.push(
            warning(
                ViolationRule::OperationIdFormat,
                path,
                format!(
                    "operationId {:?} should be lowercase words joined by underscores",
                    id
                ),
            )
            .with_method(method),
        ),
        Some(_) => {}
    }
}

fn warning(rule: ViolationRule, path: &str, message: String) -> Violation {
    Violation::new(Category::Naming, rule, rule.severity(), path, message)
}

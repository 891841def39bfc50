//! Checks that every operation documents its responses.

use crate::document::{ApiDocument, HttpMethod, Operation};

use super::{Category, GovernanceRule, Violation, ViolationRule};

/// At least one of these must be defined.
pub const SUCCESS_CODES: &[&str] = &["200", "201", "204"];
/// At least one of these should be defined.
pub const CLIENT_ERROR_CODES: &[&str] = &["400", "401", "403", "404"];
/// This should be defined.
pub const SERVER_ERROR_CODE: &str = "500";

/// Response definitions per operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponsesRule;

impl GovernanceRule for ResponsesRule {
    fn name(&self) -> &'static str {
        "responses"
    }

    fn category(&self) -> Category {
        Category::Responses
    }

    fn check(&self, doc: &ApiDocument) -> Vec<Violation> {
        let mut violations = Vec::new();
        for op in doc.operations() {
            check_operation(doc, op.path, op.method, op.operation, &mut violations);
        }
        violations
    }
}

fn check_operation(
    doc: &ApiDocument,
    path: &str,
    method: HttpMethod,
    operation: &Operation,
    violations: &mut Vec<Violation>,
) {
    let responses = match &operation.responses {
        Some(r) if !r.is_empty() => r,
        _ => {
            violations.push(violation(
                ViolationRule::MissingResponses,
                path,
                method,
                "no responses defined for this operation".to_string(),
            ));
            return;
        }
    };

    for (code, response) in responses {
        let code_str = code.as_str();
        let response = doc.resolve_response(response);

        if !code.numeric().is_some_and(|n| (100..=599).contains(&n)) {
            violations.push(
                violation(
                    ViolationRule::InvalidStatusCode,
                    path,
                    method,
                    format!("invalid HTTP status code {:?}", code_str),
                )
                .with_status_code(code_str),
            );
        }

        if response
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
        {
            violations.push(
                violation(
                    ViolationRule::MissingResponseDescription,
                    path,
                    method,
                    format!("response {} description is missing or empty", code_str),
                )
                .with_status_code(code_str),
            );
        }

        if code_str.starts_with('2') && !response.has_content() {
            violations.push(
                violation(
                    ViolationRule::MissingSuccessContent,
                    path,
                    method,
                    format!(
                        "successful response {} should specify content and media types",
                        code_str
                    ),
                )
                .with_status_code(code_str),
            );
        }
    }

    if !SUCCESS_CODES.iter().any(|c| responses.contains_key(*c)) {
        violations.push(violation(
            ViolationRule::MissingSuccessResponse,
            path,
            method,
            format!(
                "successful response must be defined (one of {})",
                SUCCESS_CODES.join(", ")
            ),
        ));
    }

    if !CLIENT_ERROR_CODES.iter().any(|c| responses.contains_key(*c)) {
        violations.push(violation(
            ViolationRule::MissingClientErrorResponse,
            path,
            method,
            format!(
                "client error response should be defined (one of {})",
                CLIENT_ERROR_CODES.join(", ")
            ),
        ));
    }

    if !responses.contains_key(SERVER_ERROR_CODE) {
        violations.push(violation(
            ViolationRule::MissingServerErrorResponse,
            path,
            method,
            format!("server error response {} should be defined", SERVER_ERROR_CODE),
        ));
    }
}

fn violation(rule: ViolationRule, path: &str, method: HttpMethod, message: String) -> Violation {
    Violation::new(Category::Responses, rule, rule.severity(), path, message).with_method(method)
}

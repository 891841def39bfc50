//! Transport and authentication checks.
//!
//! Runs in two passes: the operation scan collects the set of security
//! schemes that operations actually reference, and only then can unused
//! declarations be reported.

use std::collections::BTreeSet;

use crate::document::{ApiDocument, OperationRef};

use super::{Category, GovernanceRule, Violation, ViolationRule};

/// Required prefix for every server URL.
pub const SECURE_SCHEME_PREFIX: &str = "https://";

/// Recognized security scheme types.
pub const VALID_SCHEME_TYPES: &[&str] = &["apiKey", "http", "oauth2", "openIdConnect"];

/// Valid locations for an apiKey scheme.
pub const VALID_API_KEY_LOCATIONS: &[&str] = &["header", "query", "cookie"];

const SCHEMES_PATH: &str = "components.securitySchemes";

/// Transport security, scheme declarations and per-operation auth.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityRule;

impl GovernanceRule for SecurityRule {
    fn name(&self) -> &'static str {
        "security"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn check(&self, doc: &ApiDocument) -> Vec<Violation> {
        let mut violations = check_servers(doc);
        violations.extend(check_scheme_declarations(doc));

        let (operation_violations, used) = scan_operations(doc);
        violations.extend(operation_violations);
        violations.extend(unused_schemes(doc, &used));

        violations
    }
}

/// Every declared server must use HTTPS; a document without a `servers`
/// key gets a single warning.
pub fn check_servers(doc: &ApiDocument) -> Vec<Violation> {
    let servers = match &doc.servers {
        Some(s) => s,
        None => {
            return vec![violation(
                ViolationRule::MissingServers,
                "servers",
                "no servers defined; at least one HTTPS server is required".to_string(),
            )];
        }
    };

    servers
        .iter()
        .filter_map(|server| {
            let url = server.url.as_deref().unwrap_or("");
            if url.starts_with(SECURE_SCHEME_PREFIX) {
                return None;
            }
            Some(violation(
                ViolationRule::InsecureServer,
                "servers.url",
                format!("server URL {:?} is not HTTPS; TLS is required", url),
            ))
        })
        .collect()
}

/// Validate the type and apiKey location of every declared scheme.
pub fn check_scheme_declarations(doc: &ApiDocument) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (name, scheme) in doc.security_schemes() {
        let path = format!("{}.{}", SCHEMES_PATH, name);
        let kind = scheme.kind.as_deref();

        match kind {
            Some(k) if VALID_SCHEME_TYPES.contains(&k) => {}
            Some(k) => violations.push(violation(
                ViolationRule::InvalidSchemeType,
                &path,
                format!(
                    "security scheme {:?} has invalid type {:?} (expected one of {})",
                    name,
                    k,
                    VALID_SCHEME_TYPES.join(", ")
                ),
            )),
            None => violations.push(violation(
                ViolationRule::InvalidSchemeType,
                &path,
                format!("security scheme {:?} has no type", name),
            )),
        }

        if kind == Some("apiKey") {
            let location = scheme.location.as_deref();
            if !location.is_some_and(|l| VALID_API_KEY_LOCATIONS.contains(&l)) {
                violations.push(violation(
                    ViolationRule::InvalidApiKeyLocation,
                    &path,
                    format!(
                        "apiKey security scheme {:?} must have 'in' set to header, query or cookie (found {:?})",
                        name,
                        location.unwrap_or("")
                    ),
                ));
            }
        }
    }

    violations
}

/// First pass: per-operation findings plus the names of every scheme an
/// operation successfully references.
pub fn scan_operations(doc: &ApiDocument) -> (Vec<Violation>, BTreeSet<String>) {
    let mut violations = Vec::new();
    let mut used = BTreeSet::new();
    let global_security = doc.has_global_security();

    for op in doc.operations() {
        check_operation(doc, op, global_security, &mut violations, &mut used);
    }

    (violations, used)
}

fn check_operation(
    doc: &ApiDocument,
    op: OperationRef<'_>,
    global_security: bool,
    violations: &mut Vec<Violation>,
    used: &mut BTreeSet<String>,
) {
    let OperationRef {
        path,
        method,
        operation,
    } = op;
    let has_security = operation.has_security();
    let label = format!("{} {}", method.as_str().to_uppercase(), path);

    if !has_security && !global_security {
        violations.push(
            violation(
                ViolationRule::UnsecuredOperation,
                path,
                format!("no security scheme defined globally or on {}", label),
            )
            .with_method(method),
        );

        if method.is_unsafe() {
            violations.push(
                violation(
                    ViolationRule::UnsecuredUnsafeMethod,
                    path,
                    format!(
                        "unsafe method {} must be protected by a security scheme",
                        method.as_str().to_uppercase()
                    ),
                )
                .with_method(method),
            );
        }
    }

    if let Some(requirements) = operation.security.as_ref().filter(|_| has_security) {
        let mut uses_bearer = false;

        for requirement in requirements {
            for name in requirement.keys() {
                match doc.security_scheme(name) {
                    Some(scheme) => {
                        uses_bearer |= scheme.is_bearer();
                        used.insert(name.clone());
                    }
                    None => violations.push(
                        violation(
                            ViolationRule::UndefinedSecurityScheme,
                            path,
                            format!(
                                "security scheme {:?} is not defined in {}",
                                name, SCHEMES_PATH
                            ),
                        )
                        .with_method(method),
                    ),
                }
            }
        }

        if !uses_bearer {
            violations.push(
                violation(
                    ViolationRule::MissingBearerAuth,
                    path,
                    format!(
                        "{} should use bearer token (JWT) authentication where applicable",
                        label
                    ),
                )
                .with_method(method),
            );
        }
    }

    match &operation.responses {
        Some(responses) => {
            if !responses.contains_key("429") {
                violations.push(
                    violation(
                        ViolationRule::MissingRateLimitResponse,
                        path,
                        "rate-limit response (429 Too Many Requests) recommended".to_string(),
                    )
                    .with_method(method),
                );
            }
        }
        None => violations.push(
            violation(
                ViolationRule::RateLimitUnverifiable,
                path,
                "no responses defined; cannot check for a rate-limit response".to_string(),
            )
            .with_method(method),
        ),
    }
}

/// Second pass: declared schemes that no operation references.
pub fn unused_schemes(doc: &ApiDocument, used: &BTreeSet<String>) -> Vec<Violation> {
    doc.security_schemes()
        .filter(|(name, _)| !used.contains(*name))
        .map(|(name, _)| {
            violation(
                ViolationRule::UnusedSecurityScheme,
                SCHEMES_PATH,
                format!(
                    "security scheme {:?} is declared but unused by any operation",
                    name
                ),
            )
        })
        .collect()
}

fn violation(rule: ViolationRule, path: &str, message: String) -> Violation {
    Violation::new(Category::Security, rule, rule.severity(), path, message)
}

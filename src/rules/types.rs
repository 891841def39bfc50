//! Core types for governance findings.

use serde::{Deserialize, Serialize};

use crate::document::{ApiDocument, HttpMethod};

/// Severity levels for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Governance dimension a violation is scored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Responses,
    Naming,
    Versioning,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Security,
        Category::Responses,
        Category::Naming,
        Category::Versioning,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Responses => "responses",
            Category::Naming => "naming",
            Category::Versioning => "versioning",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier of each individual governance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    // Info block
    MissingInfo,
    MissingTitle,
    ShortDescription,
    MissingVersion,
    NonSemverVersion,
    // Naming
    MissingApiPrefix,
    UppercasePath,
    UnderscorePath,
    TrailingSlash,
    VerbSegment,
    SingularCollection,
    UnclearHierarchy,
    MissingOperationId,
    OperationIdFormat,
    // Responses
    MissingResponses,
    InvalidStatusCode,
    MissingResponseDescription,
    MissingSuccessContent,
    MissingSuccessResponse,
    MissingClientErrorResponse,
    MissingServerErrorResponse,
    // Security
    MissingServers,
    InsecureServer,
    InvalidSchemeType,
    InvalidApiKeyLocation,
    UnsecuredOperation,
    UnsecuredUnsafeMethod,
    UndefinedSecurityScheme,
    MissingBearerAuth,
    MissingRateLimitResponse,
    RateLimitUnverifiable,
    UnusedSecurityScheme,
}

impl ViolationRule {
    pub const ALL: [ViolationRule; 32] = [
        ViolationRule::MissingInfo,
        ViolationRule::MissingTitle,
        ViolationRule::ShortDescription,
        ViolationRule::MissingVersion,
        ViolationRule::NonSemverVersion,
        ViolationRule::MissingApiPrefix,
        ViolationRule::UppercasePath,
        ViolationRule::UnderscorePath,
        ViolationRule::TrailingSlash,
        ViolationRule::VerbSegment,
        ViolationRule::SingularCollection,
        ViolationRule::UnclearHierarchy,
        ViolationRule::MissingOperationId,
        ViolationRule::OperationIdFormat,
        ViolationRule::MissingResponses,
        ViolationRule::InvalidStatusCode,
        ViolationRule::MissingResponseDescription,
        ViolationRule::MissingSuccessContent,
        ViolationRule::MissingSuccessResponse,
        ViolationRule::MissingClientErrorResponse,
        ViolationRule::MissingServerErrorResponse,
        ViolationRule::MissingServers,
        ViolationRule::InsecureServer,
        ViolationRule::InvalidSchemeType,
        ViolationRule::InvalidApiKeyLocation,
        ViolationRule::UnsecuredOperation,
        ViolationRule::UnsecuredUnsafeMethod,
        ViolationRule::UndefinedSecurityScheme,
        ViolationRule::MissingBearerAuth,
        ViolationRule::MissingRateLimitResponse,
        ViolationRule::RateLimitUnverifiable,
        ViolationRule::UnusedSecurityScheme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationRule::MissingInfo => "missing_info",
            ViolationRule::MissingTitle => "missing_title",
            ViolationRule::ShortDescription => "short_description",
            ViolationRule::MissingVersion => "missing_version",
            ViolationRule::NonSemverVersion => "non_semver_version",
            ViolationRule::MissingApiPrefix => "missing_api_prefix",
            ViolationRule::UppercasePath => "uppercase_path",
            ViolationRule::UnderscorePath => "underscore_path",
            ViolationRule::TrailingSlash => "trailing_slash",
            ViolationRule::VerbSegment => "verb_segment",
            ViolationRule::SingularCollection => "singular_collection",
            ViolationRule::UnclearHierarchy => "unclear_hierarchy",
            ViolationRule::MissingOperationId => "missing_operation_id",
            ViolationRule::OperationIdFormat => "operation_id_format",
            ViolationRule::MissingResponses => "missing_responses",
            ViolationRule::InvalidStatusCode => "invalid_status_code",
            ViolationRule::MissingResponseDescription => "missing_response_description",
            ViolationRule::MissingSuccessContent => "missing_success_content",
            ViolationRule::MissingSuccessResponse => "missing_success_response",
            ViolationRule::MissingClientErrorResponse => "missing_client_error_response",
            ViolationRule::MissingServerErrorResponse => "missing_server_error_response",
            ViolationRule::MissingServers => "missing_servers",
            ViolationRule::InsecureServer => "insecure_server",
            ViolationRule::InvalidSchemeType => "invalid_scheme_type",
            ViolationRule::InvalidApiKeyLocation => "invalid_api_key_location",
            ViolationRule::UnsecuredOperation => "unsecured_operation",
            ViolationRule::UnsecuredUnsafeMethod => "unsecured_unsafe_method",
            ViolationRule::UndefinedSecurityScheme => "undefined_security_scheme",
            ViolationRule::MissingBearerAuth => "missing_bearer_auth",
            ViolationRule::MissingRateLimitResponse => "missing_rate_limit_response",
            ViolationRule::RateLimitUnverifiable => "rate_limit_unverifiable",
            ViolationRule::UnusedSecurityScheme => "unused_security_scheme",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|rule| rule.as_str() == s)
    }

    /// Category the owning check emits this rule under.
    pub fn category(&self) -> Category {
        use ViolationRule::*;
        match self {
            MissingInfo | MissingTitle | ShortDescription | MissingVersion | NonSemverVersion => {
                Category::Versioning
            }
            MissingApiPrefix | UppercasePath | UnderscorePath | TrailingSlash | VerbSegment
            | SingularCollection | UnclearHierarchy | MissingOperationId | OperationIdFormat => {
                Category::Naming
            }
            MissingResponses
            | InvalidStatusCode
            | MissingResponseDescription
            | MissingSuccessContent
            | MissingSuccessResponse
            | MissingClientErrorResponse
            | MissingServerErrorResponse => Category::Responses,
            MissingServers
            | InsecureServer
            | InvalidSchemeType
            | InvalidApiKeyLocation
            | UnsecuredOperation
            | UnsecuredUnsafeMethod
            | UndefinedSecurityScheme
            | MissingBearerAuth
            | MissingRateLimitResponse
            | RateLimitUnverifiable
            | UnusedSecurityScheme => Category::Security,
        }
    }

    /// Severity this rule is always reported with.
    pub fn severity(&self) -> Severity {
        use ViolationRule::*;
        match self {
            MissingInfo | MissingTitle | MissingVersion | MissingOperationId
            | MissingResponses | MissingSuccessResponse | InsecureServer | InvalidSchemeType
            | InvalidApiKeyLocation | UnsecuredOperation | UnsecuredUnsafeMethod
            | UndefinedSecurityScheme | RateLimitUnverifiable => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// One-line explanation used by `apigov rules` and SARIF output.
    pub fn description(&self) -> &'static str {
        match self {
            ViolationRule::MissingInfo => "The document has no info object",
            ViolationRule::MissingTitle => "info.title is missing or empty",
            ViolationRule::ShortDescription => {
                "info.description is missing or shorter than 10 characters"
            }
            ViolationRule::MissingVersion => "info.version is missing",
            ViolationRule::NonSemverVersion => "info.version is not MAJOR.MINOR.PATCH",
            ViolationRule::MissingApiPrefix => "Path does not start with /api",
            ViolationRule::UppercasePath => "Path contains uppercase characters",
            ViolationRule::UnderscorePath => "Path uses underscores instead of hyphens",
            ViolationRule::TrailingSlash => "Path ends with a trailing slash",
            ViolationRule::VerbSegment => "Path segment is a verb rather than a noun",
            ViolationRule::SingularCollection => "Last path segment is not plural",
            ViolationRule::UnclearHierarchy => {
                "Segment after an identifier is not a plural sub-collection"
            }
            ViolationRule::MissingOperationId => "Operation has no operationId",
            ViolationRule::OperationIdFormat => "operationId is not lowercase snake_case",
            ViolationRule::MissingResponses => "Operation defines no responses",
            ViolationRule::InvalidStatusCode => "Response key is not a status code in 100-599",
            ViolationRule::MissingResponseDescription => "Response has no description",
            ViolationRule::MissingSuccessContent => "2xx response declares no content",
            ViolationRule::MissingSuccessResponse => "None of 200, 201 or 204 is defined",
            ViolationRule::MissingClientErrorResponse => {
                "None of 400, 401, 403 or 404 is defined"
            }
            ViolationRule::MissingServerErrorResponse => "No 500 response is defined",
            ViolationRule::MissingServers => "The document declares no servers",
            ViolationRule::InsecureServer => "Server URL does not use https://",
            ViolationRule::InvalidSchemeType => "Security scheme type is not recognized",
            ViolationRule::InvalidApiKeyLocation => {
                "apiKey scheme is not in header, query or cookie"
            }
            ViolationRule::UnsecuredOperation => {
                "Operation has no security, globally or locally"
            }
            ViolationRule::UnsecuredUnsafeMethod => {
                "State-changing operation has no security scheme"
            }
            ViolationRule::UndefinedSecurityScheme => {
                "Security requirement names an undeclared scheme"
            }
            ViolationRule::MissingBearerAuth => "Operation security does not use a bearer scheme",
            ViolationRule::MissingRateLimitResponse => "No 429 response is defined",
            ViolationRule::RateLimitUnverifiable => {
                "No responses, so rate limiting cannot be checked"
            }
            ViolationRule::UnusedSecurityScheme => "Security scheme is never used by an operation",
        }
    }
}

impl std::fmt::Display for ViolationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single governance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub category: Category,
    pub rule: ViolationRule,
}

impl Violation {
    /// Document-level violation. The category is supplied by the emitting
    /// check and never inferred afterwards.
    pub fn new(
        category: Category,
        rule: ViolationRule,
        severity: Severity,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method: None,
            status_code: None,
            message: message.into(),
            severity,
            category,
            rule,
        }
    }

    /// Attach the HTTP method of the offending operation.
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method.as_str().to_string());
        self
    }

    /// Attach the offending response status code.
    pub fn with_status_code(mut self, code: impl Into<String>) -> Self {
        self.status_code = Some(code.into());
        self
    }
}

/// One governance check over a whole document.
///
/// Implementations only read the document and return their own findings;
/// the runner concatenates the outputs in registration order.
pub trait GovernanceRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Category stamped on every violation this check emits.
    fn category(&self) -> Category;

    /// Evaluate the document.
    fn check(&self, doc: &ApiDocument) -> Vec<Violation>;
}

//! In-memory model of an OpenAPI document.
//!
//! The model is deliberately lenient: every field the governance rules look
//! at is optional, because a missing field is something the rules report on
//! rather than a reason to reject the document. Only documents that cannot
//! be deserialized at all (e.g. `paths` that is not a mapping) fail to load.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a document from disk or text.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A security requirement: scheme name to required scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// Top-level OpenAPI document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<BTreeMap<String, PathItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Global security requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// The `info` block.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Info {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// One entry of the `servers` list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Server {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `components` block. Only the parts the rules consult are modeled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Components {
    #[serde(
        default,
        rename = "securitySchemes",
        skip_serializing_if = "Option::is_none"
    )]
    pub security_schemes: Option<BTreeMap<String, SecurityScheme>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Response>,
}

/// A declared security scheme. Values are kept as raw strings so that
/// unknown types and locations can be reported verbatim.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecurityScheme {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default, rename = "bearerFormat")]
    pub bearer_format: Option<String>,
    #[serde(default, rename = "in")]
    pub location: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityScheme {
    /// True for `type: http` schemes using the bearer authorization scheme.
    pub fn is_bearer(&self) -> bool {
        self.kind.as_deref() == Some("http")
            && self
                .scheme
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("bearer"))
    }
}

/// HTTP methods that can carry an operation under a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// Methods that change server state.
    pub fn is_unsafe(&self) -> bool {
        matches!(
            self,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete | HttpMethod::Patch
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operations and shared metadata declared under one path.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    /// Declared operations in fixed method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Options, &self.options),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Trace, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// A single HTTP operation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Operation {
    #[serde(default, rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<BTreeMap<StatusCode, Response>>,
    /// Operation-level override of the global security requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub deprecated: bool,
}

impl Operation {
    /// True when the operation lists at least one security requirement.
    pub fn has_security(&self) -> bool {
        self.security.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// An operation or path parameter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "in")]
    pub location: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

/// A response definition, possibly a `$ref` to `components.responses`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Response {
    #[serde(default, rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

impl Response {
    /// True when at least one media type is declared.
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A media type entry under `content`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

/// Key of a `responses` map.
///
/// JSON documents always use string keys, YAML documents frequently use
/// bare integers (`200:`). Both are accepted and kept as text, so that
/// non-numeric keys such as `default` or `2XX` reach the rules unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(String);

impl StatusCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value when the key is exactly three ASCII digits.
    pub fn numeric(&self) -> Option<u16> {
        if self.0.len() == 3 && self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }
}

impl Borrow<str> for StatusCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusCodeVisitor;

        impl<'de> Visitor<'de> for StatusCodeVisitor {
            type Value = StatusCode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a status code string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StatusCode, E> {
                Ok(StatusCode(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<StatusCode, E> {
                Ok(StatusCode(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<StatusCode, E> {
                Ok(StatusCode(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<StatusCode, E> {
                Ok(StatusCode(v.to_string()))
            }
        }

        deserializer.deserialize_any(StatusCodeVisitor)
    }
}

/// A borrowed view of one operation together with its location.
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub operation: &'a Operation,
}

/// Top-level version keys, read without building the full model.
#[derive(Debug, Deserialize)]
struct VersionMarker {
    #[serde(default)]
    openapi: Option<serde_json::Value>,
    #[serde(default)]
    swagger: Option<serde_json::Value>,
}

enum SourceFormat {
    Json,
    Yaml,
    Unknown,
}

fn read_source(path: &Path) -> Result<(String, SourceFormat), DocumentError> {
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let format = match ext.as_deref() {
        Some("json") => SourceFormat::Json,
        Some("yaml") | Some("yml") => SourceFormat::Yaml,
        _ => SourceFormat::Unknown,
    };
    Ok((content, format))
}

impl ApiDocument {
    /// Parse a document from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a document from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a document from disk. The format is picked from the file
    /// extension; unknown extensions are tried as JSON, then YAML.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let (content, format) = read_source(path.as_ref())?;
        match format {
            SourceFormat::Json => Self::from_json_str(&content),
            SourceFormat::Yaml => Self::from_yaml_str(&content),
            SourceFormat::Unknown => {
                Self::from_json_str(&content).or_else(|_| Self::from_yaml_str(&content))
            }
        }
    }

    /// True when the file is a mapping with a top-level `openapi` or
    /// `swagger` key. Files that do not parse as a mapping are not API
    /// documents; only read failures are errors.
    pub fn is_api_document_file<P: AsRef<Path>>(path: P) -> Result<bool, DocumentError> {
        let (content, format) = read_source(path.as_ref())?;
        let json = || serde_json::from_str::<VersionMarker>(&content).ok();
        let yaml = || serde_yaml::from_str::<VersionMarker>(&content).ok();
        let marker = match format {
            SourceFormat::Json => json(),
            SourceFormat::Yaml => yaml(),
            SourceFormat::Unknown => json().or_else(yaml),
        };
        Ok(marker.is_some_and(|m| m.openapi.is_some() || m.swagger.is_some()))
    }

    /// All operations, paths in lexical order and methods in slot order.
    pub fn operations(&self) -> impl Iterator<Item = OperationRef<'_>> {
        self.paths.iter().flatten().flat_map(|(path, item)| {
            item.operations().map(move |(method, operation)| OperationRef {
                path: path.as_str(),
                method,
                operation,
            })
        })
    }

    /// Number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.operations().count()
    }

    /// True when the document declares a non-empty global security list.
    pub fn has_global_security(&self) -> bool {
        self.security.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Declared security schemes, empty when `components` is absent.
    pub fn security_schemes(&self) -> impl Iterator<Item = (&String, &SecurityScheme)> {
        self.components
            .iter()
            .filter_map(|c| c.security_schemes.as_ref())
            .flatten()
    }

    /// Look up a declared security scheme by name.
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.components
            .as_ref()
            .and_then(|c| c.security_schemes.as_ref())
            .and_then(|schemes| schemes.get(name))
    }

    /// Follow a local `#/components/responses/<name>` reference.
    /// Responses without a reference, and references that do not resolve,
    /// are returned as written.
    pub fn resolve_response<'a>(&'a self, response: &'a Response) -> &'a Response {
        let Some(name) = response
            .reference
            .as_deref()
            .and_then(|r| r.strip_prefix("#/components/responses/"))
        else {
            return response;
        };
        self.components
            .as_ref()
            .and_then(|c| c.responses.get(name))
            .unwrap_or(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_json() {
        let doc = ApiDocument::from_json_str("{}").unwrap();
        assert!(doc.info.is_none());
        assert!(doc.paths.is_none());
        assert_eq!(doc.operation_count(), 0);
        assert!(!doc.has_global_security());
    }

    #[test]
    fn test_yaml_integer_status_keys() {
        let yaml = r#"
paths:
  /api/users:
    get:
      responses:
        200:
          description: OK
        default:
          description: Error
"#;
        let doc = ApiDocument::from_yaml_str(yaml).unwrap();
        let op = doc.operations().next().unwrap();
        let responses = op.operation.responses.as_ref().unwrap();
        assert!(responses.contains_key("200"));
        assert!(responses.contains_key("default"));
    }

    #[test]
    fn test_non_method_keys_are_not_operations() {
        let json = r#"{
            "paths": {
                "/api/users/{id}": {
                    "summary": "A user",
                    "parameters": [{"name": "id", "in": "path", "required": true}],
                    "delete": {"operationId": "delete_user"},
                    "get": {"operationId": "get_user"}
                }
            }
        }"#;
        let doc = ApiDocument::from_json_str(json).unwrap();
        let methods: Vec<_> = doc.operations().map(|o| o.method).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Delete]);
    }

    #[test]
    fn test_paths_not_a_mapping_is_rejected() {
        let err = ApiDocument::from_json_str(r#"{"paths": ["/api/users"]}"#).unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn test_resolve_response_reference() {
        let json = r##"{
            "components": {
                "responses": {"NotFound": {"description": "Not found"}}
            }
        }"##;
        let doc = ApiDocument::from_json_str(json).unwrap();
        let local = Response {
            reference: Some("#/components/responses/NotFound".to_string()),
            ..Default::default()
        };
        assert_eq!(
            doc.resolve_response(&local).description.as_deref(),
            Some("Not found")
        );

        let dangling = Response {
            reference: Some("#/components/responses/Missing".to_string()),
            ..Default::default()
        };
        assert!(doc.resolve_response(&dangling).description.is_none());
    }

    #[test]
    fn test_status_code_numeric() {
        assert_eq!(StatusCode::new("404").numeric(), Some(404));
        assert_eq!(StatusCode::new("2XX").numeric(), None);
        assert_eq!(StatusCode::new("1000").numeric(), None);
        assert_eq!(StatusCode::new("default").numeric(), None);
    }

    #[test]
    fn test_parse_file_by_extension() {
        let temp = TempDir::new().unwrap();
        let yaml_path = temp.path().join("api.yml");
        std::fs::write(&yaml_path, "info:\n  title: Demo\n").unwrap();
        let doc = ApiDocument::parse_file(&yaml_path).unwrap();
        assert_eq!(doc.info.unwrap().title.as_deref(), Some("Demo"));

        let missing = ApiDocument::parse_file(temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, DocumentError::Io { .. }));
    }

    #[test]
    fn test_is_api_document_file() {
        let temp = TempDir::new().unwrap();
        let cases = [
            ("openapi.json", r#"{"openapi": "3.0.3", "info": {}}"#, true),
            ("legacy.yaml", "swagger: \"2.0\"\npaths: {}\n", true),
            ("api.yml", "openapi: 3.1.0\n", true),
            ("package.json", r#"{"name": "svc", "version": "1.0.0"}"#, false),
            ("apigov.yaml", include_str!("templates/default.yaml"), false),
            ("list.yaml", "- openapi\n- swagger\n", false),
            ("garbage.json", "{not json", false),
        ];

        for (name, content, expected) in cases {
            let path = temp.path().join(name);
            std::fs::write(&path, content).unwrap();
            assert_eq!(ApiDocument::is_api_document_file(&path).unwrap(), expected, "{}", name);
        }

        assert!(ApiDocument::is_api_document_file(temp.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_bearer_scheme() {
        let scheme = SecurityScheme {
            kind: Some("http".to_string()),
            scheme: Some("Bearer".to_string()),
            ..Default::default()
        };
        assert!(scheme.is_bearer());

        let basic = SecurityScheme {
            kind: Some("http".to_string()),
            scheme: Some("basic".to_string()),
            ..Default::default()
        };
        assert!(!basic.is_bearer());
    }
}

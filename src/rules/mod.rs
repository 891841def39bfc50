//! Governance checks over an OpenAPI document.
//!
//! Each check is a [`GovernanceRule`]: a pure function from the document to
//! the violations it finds. The [`Runner`] holds them in order and
//! concatenates their output.

mod info;
mod naming;
mod responses;
mod runner;
pub mod security;
mod types;

pub use info::InfoRule;
pub use naming::NamingRule;
pub use responses::ResponsesRule;
pub use runner::Runner;
pub use security::SecurityRule;
pub use types::{Category, GovernanceRule, Severity, Violation, ViolationRule};

//! Command-line interface for apigov.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::ApiDocument;
use crate::policy::{self, Policy};
use crate::report::{self, Evaluation};
use crate::rules::{Runner, ViolationRule};
use crate::score;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default policy file names to search for.
const DEFAULT_POLICY_NAMES: &[&str] = &["apigov.yaml", ".apigov.yaml", "governance.yaml"];

/// Extensions of candidate documents when walking a directory.
const DOCUMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// OpenAPI governance gate.
///
/// Checks API descriptions against naming, response, security and
/// versioning rules, and scores their compliance from 0 to 100.
#[derive(Parser)]
#[command(name = "apigov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check OpenAPI documents against the governance rules
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// Create a new policy file from a template
    Init(InitArgs),
    /// List every governance rule
    Rules,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Document or directory to check
    pub path: PathBuf,

    /// Path to policy YAML file (default: auto-discover)
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Normalization denominator for scoring
    #[arg(long)]
    pub total_apis: Option<usize>,

    /// Normalize each document's score by its operation count
    #[arg(long)]
    pub per_operation: bool,

    /// Minimum passing score (default: any violation fails)
    #[arg(short, long)]
    pub min_score: Option<i32>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "apigov.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available policy templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

/// All available templates.
static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Standard weights; any violation fails the gate",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "security-first",
        description: "Security-heavy weights, per-operation scoring, minimum score 85",
        content: include_str!("templates/security-first.yaml"),
    },
];

/// Discover a policy file in the current directory.
fn discover_policy() -> Option<PathBuf> {
    DEFAULT_POLICY_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Load the policy named on the command line, a discovered one, or the
/// default. Also returns the file the policy came from.
fn load_policy(explicit: Option<&Path>) -> anyhow::Result<(Policy, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => discover_policy(),
    };

    match path {
        Some(path) => {
            let policy = Policy::parse_file(&path)
                .map_err(|e| anyhow::anyhow!("parsing policy {}: {}", path.display(), e))?;
            debug!(policy = %path.display(), "loaded policy");
            Ok((policy, Some(path)))
        }
        None => {
            debug!("no policy file found, using built-in default");
            Ok((Policy::default(), None))
        }
    }
}

/// Collect candidate JSON/YAML files below a directory, in path order.
pub fn collect_documents(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories and dependency trees
            !name.starts_with('.') && name != "node_modules"
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Keep the candidates that declare an `openapi` or `swagger` version,
/// dropping the policy file in use.
pub fn select_documents(
    candidates: Vec<PathBuf>,
    policy_path: Option<&Path>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut documents = Vec::with_capacity(candidates.len());
    for path in candidates {
        if policy_path.is_some_and(|p| same_file(&path, p)) {
            debug!(path = %path.display(), "skipping policy file");
            continue;
        }
        if !ApiDocument::is_api_document_file(&path)? {
            warn!(path = %path.display(), "skipping file without an openapi or swagger key");
            continue;
        }
        documents.push(path);
    }
    Ok(documents)
}

/// Load and evaluate one document under the policy.
fn evaluate_file(path: &Path, policy: &Policy, runner: &Runner) -> anyhow::Result<Evaluation> {
    let doc = ApiDocument::parse_file(path)?;
    let total_apis = policy.total_apis_for(&doc);
    let violations = runner.run(&doc);
    let compliance = score::calculate(&violations, total_apis, &policy.scoring);

    info!(
        document = %path.display(),
        score = compliance.score,
        violations = violations.len(),
        "evaluated document"
    );

    Ok(Evaluation::new(
        path.display().to_string(),
        violations,
        compliance,
        policy.min_score,
    ))
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let (mut policy, policy_path) = match load_policy(args.policy.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Command-line overrides
    if let Some(total) = args.total_apis {
        policy.total_apis = total;
    }
    if args.per_operation {
        policy.normalize_by_operations = true;
    }
    if args.min_score.is_some() {
        policy.min_score = args.min_score;
    }

    if let Err(e) = policy::validate(&policy) {
        eprintln!("Error: invalid policy: {}", e);
        return Ok(EXIT_ERROR);
    }

    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    // Directories may hold other JSON/YAML files; a named file is always checked
    let files = if metadata.is_dir() {
        select_documents(collect_documents(&args.path)?, policy_path.as_deref())?
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        warn!(path = %args.path.display(), "no documents found");
        eprintln!("Warning: no documents to check");
        return Ok(EXIT_SUCCESS);
    }

    debug!(count = files.len(), "evaluating documents");

    let runner = Runner::new();
    let results: Vec<anyhow::Result<Evaluation>> = files
        .par_iter()
        .map(|path| evaluate_file(path, &policy, &runner))
        .collect();

    let mut evaluations = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(eval) => evaluations.push(eval),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    match args.format.as_str() {
        "json" => report::write_json(&evaluations)?,
        "sarif" => report::write_sarif(&evaluations)?,
        _ => {
            let policy_name = policy_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in default".to_string());
            report::write_pretty(&evaluations, &policy_name)
        }
    }

    if evaluations.iter().all(|e| e.passed()) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // List mode
    if args.list {
        return list_templates();
    }

    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'apigov init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write policy: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune weights and the minimum score", args.output.display());
    println!("  2. Run: apigov check openapi.yaml --policy {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "default" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  apigov init --template <name>");

    Ok(EXIT_SUCCESS)
}

/// Run the rules command.
pub fn run_rules() -> anyhow::Result<i32> {
    println!("  {:<32} {:<11} {:<8} DESCRIPTION", "RULE", "CATEGORY", "SEVERITY");
    for rule in ViolationRule::ALL {
        println!(
            "  {:<32} {:<11} {:<8} {}",
            rule.as_str(),
            rule.category().as_str(),
            rule.severity().to_string(),
            rule.description()
        );
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLEAN_DOC: &str = r#"{
        "openapi": "3.0.3",
        "info": {"title": "Users", "description": "User management API", "version": "1.0.0"},
        "servers": [{"url": "https://api.example.com"}],
        "paths": {}
    }"#;

    fn check_args(path: PathBuf) -> CheckArgs {
        CheckArgs {
            path,
            policy: None,
            format: "json".to_string(),
            total_apis: None,
            per_operation: false,
            min_score: None,
        }
    }

    #[test]
    fn test_collect_documents_skips_hidden_and_node_modules() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("specs")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();

        std::fs::write(root.join("b.yaml"), "{}").unwrap();
        std::fs::write(root.join("specs/a.json"), "{}").unwrap();
        std::fs::write(root.join("specs/c.YML"), "{}").unwrap();
        std::fs::write(root.join("notes.txt"), "").unwrap();
        std::fs::write(root.join(".git/config.yaml"), "{}").unwrap();
        std::fs::write(root.join("node_modules/pkg/openapi.json"), "{}").unwrap();

        let files = collect_documents(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.yaml", "specs/a.json", "specs/c.YML"]);
    }

    /// A clean document beside the kind of JSON/YAML files a service repo holds.
    fn mixed_directory() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("openapi.json"), CLEAN_DOC).unwrap();
        std::fs::write(root.join("package.json"), r#"{"name":"svc","version":"1.0.0"}"#).unwrap();
        std::fs::write(root.join("tsconfig.json"), r#"{"compilerOptions":{"strict":true}}"#).unwrap();
        std::fs::write(root.join("apigov.yaml"), include_str!("templates/default.yaml")).unwrap();
        std::fs::write(root.join("ci.yml"), "on: push\njobs:\n  - build\n").unwrap();
        temp
    }

    #[test]
    fn test_select_documents_keeps_only_api_documents() {
        let temp = mixed_directory();
        let root = temp.path();

        let selected = select_documents(collect_documents(root).unwrap(), None).unwrap();
        assert_eq!(selected, vec![root.join("openapi.json")]);
    }

    #[test]
    fn test_select_documents_excludes_policy_in_use() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("openapi.json"), CLEAN_DOC).unwrap();
        // Carries an openapi key but is the policy being applied
        std::fs::write(root.join("governance.yaml"), "openapi: 3.0.3\nname: odd\n").unwrap();

        let candidates = collect_documents(root).unwrap();
        assert_eq!(candidates.len(), 2);

        let policy = root.join("governance.yaml");
        let selected = select_documents(candidates, Some(&policy)).unwrap();
        assert_eq!(selected, vec![root.join("openapi.json")]);
    }

    #[test]
    fn test_check_directory_ignores_non_api_files() {
        let temp = mixed_directory();

        assert_eq!(
            run_check(&check_args(temp.path().to_path_buf())).unwrap(),
            EXIT_SUCCESS
        );

        let mut args = check_args(temp.path().to_path_buf());
        args.policy = Some(temp.path().join("apigov.yaml"));
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_check_directory_without_api_documents() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();
        std::fs::write(temp.path().join("bad.json"), "{\"paths\": [1, 2]}").unwrap();

        assert_eq!(
            run_check(&check_args(temp.path().to_path_buf())).unwrap(),
            EXIT_SUCCESS
        );
    }

    #[test]
    fn test_check_clean_document_passes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("openapi.json");
        std::fs::write(&path, CLEAN_DOC).unwrap();

        assert_eq!(run_check(&check_args(path)).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_check_violations_fail_unless_min_score_met() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("openapi.json");
        // Short description: one versioning warning, score 90
        std::fs::write(&path, CLEAN_DOC.replace("User management API", "Users")).unwrap();

        assert_eq!(run_check(&check_args(path.clone())).unwrap(), EXIT_FAILED);

        let mut args = check_args(path);
        args.min_score = Some(90);
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_check_errors() {
        let temp = TempDir::new().unwrap();

        let mut args = check_args(temp.path().join("missing.json"));
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);

        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{\"paths\": [1, 2]}").unwrap();
        args.path = path.clone();
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);

        args.format = "xml".to_string();
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);

        let mut args = check_args(path);
        args.min_score = Some(150);
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_init_writes_template_once() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("policies/apigov.yaml");
        let args = InitArgs {
            output: output.clone(),
            template: "security-first".to_string(),
            list: false,
        };

        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let policy = Policy::parse_file(&output).unwrap();
        assert_eq!(policy.min_score, Some(85));

        // Refuses to overwrite
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

        let args = InitArgs {
            output: temp.path().join("other.yaml"),
            template: "nope".to_string(),
            list: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}

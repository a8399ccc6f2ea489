//! Schema validation for YAML source documents
//!
//! Documents are checked against the JSON Schema (draft 2020-12) catalog in
//! `data/json/schemas`. Every schema is compiled once; `$ref`s such as
//! `common.json#/$defs/...` are served from the same directory.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{GuidelineError, Result};

/// Schemas compiled by [`YamlValidator::new`]
pub const SCHEMA_NAMES: [&str; 4] = ["check", "guideline", "faq", "common"];

/// How schema violations are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Violations are errors
    #[default]
    Strict,
    /// Violations are logged and loading continues
    Warning,
    /// Documents are not inspected
    Disabled,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Warning => "warning",
            ValidationMode::Disabled => "disabled",
        })
    }
}

impl std::str::FromStr for ValidationMode {
    type Err = GuidelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "warning" => Ok(ValidationMode::Warning),
            "disabled" => Ok(ValidationMode::Disabled),
            other => Err(GuidelineError::Configuration(format!(
                "unknown validation mode '{other}', expected strict, warning or disabled"
            ))),
        }
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Path segments inside the document; empty for the root
    pub path: Vec<String>,
    pub message: String,
}

impl SchemaViolation {
    pub fn path_display(&self) -> String {
        if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path.join(" -> ")
        }
    }
}

/// All violations found in one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub schema: String,
    pub violations: Vec<SchemaViolation>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation failed for file: {}\nSchema: {}\nErrors:",
            self.path.display(),
            self.schema
        )?;
        for violation in &self.violations {
            write!(
                f,
                "\n  - Path: {}\n    Error: {}",
                violation.path_display(),
                violation.message
            )?;
        }
        Ok(())
    }
}

/// Result of validating one document under the configured mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed,
    /// Violations were found in warning mode
    Warned(ValidationReport),
    /// Validation disabled, or no schema available for the document class
    Skipped,
}

impl ValidationOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ValidationOutcome::Passed)
    }
}

/// Serves `$ref` targets from the schema directory
struct SchemaDirRetriever {
    dir: PathBuf,
}

impl Retrieve for SchemaDirRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let without_fragment = uri.as_str().split('#').next().unwrap_or_default();
        let name = without_fragment.rsplit('/').next().unwrap_or_default();
        if name.is_empty() {
            return Err(format!("cannot resolve schema reference {}", uri.as_str()).into());
        }
        let content = fs::read_to_string(self.dir.join(name))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Validator holding one compiled schema per document class
pub struct YamlValidator {
    schema_dir: PathBuf,
    mode: ValidationMode,
    validators: HashMap<String, Validator>,
}

impl fmt::Debug for YamlValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemas: Vec<_> = self.validators.keys().collect();
        schemas.sort();
        f.debug_struct("YamlValidator")
            .field("schema_dir", &self.schema_dir)
            .field("mode", &self.mode)
            .field("schemas", &schemas)
            .finish()
    }
}

impl YamlValidator {
    /// Compile the schema catalog.
    ///
    /// A missing schema file leaves its document class unvalidated; an
    /// unreadable or malformed one is an error.
    pub fn new(schema_dir: impl AsRef<Path>, mode: ValidationMode) -> Result<Self> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut validators = HashMap::new();

        if mode != ValidationMode::Disabled {
            for name in SCHEMA_NAMES {
                let path = schema_dir.join(format!("{name}.json"));
                let content = match fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        warn!(schema = name, path = %path.display(), "schema file not found, not enforced");
                        continue;
                    }
                    Err(source) => {
                        return Err(GuidelineError::FileOperation {
                            operation: "read",
                            path,
                            source,
                        })
                    }
                };
                let schema: Value = serde_json::from_str(&content)
                    .map_err(|source| GuidelineError::Json { path: path.clone(), source })?;
                let validator = jsonschema::options()
                    .with_draft(Draft::Draft202012)
                    .with_retriever(SchemaDirRetriever { dir: schema_dir.clone() })
                    .build(&schema)
                    .map_err(|e| GuidelineError::Data(format!("invalid schema {}: {e}", path.display())))?;
                debug!(schema = name, "compiled schema");
                validators.insert(name.to_string(), validator);
            }
        }

        Ok(Self {
            schema_dir,
            mode,
            validators,
        })
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Names of the schemas that were found and compiled
    pub fn available_schemas(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Collect every violation of `schema_name` in `data`
    pub fn check(&self, data: &Value, schema_name: &str, path: &Path) -> Option<ValidationReport> {
        let validator = self.validators.get(schema_name)?;
        let violations: Vec<SchemaViolation> = validator
            .iter_errors(data)
            .map(|e| SchemaViolation {
                path: pointer_segments(&e.instance_path.to_string()),
                message: match &e.kind {
                    ValidationErrorKind::Required { property } => {
                        let property = property.as_str().map(str::to_string).unwrap_or_else(|| property.to_string());
                        format!("'{property}' is a required property")
                    }
                    _ => e.to_string(),
                },
            })
            .collect();

        if violations.is_empty() {
            None
        } else {
            Some(ValidationReport {
                path: path.to_path_buf(),
                schema: schema_name.to_string(),
                violations,
            })
        }
    }

    /// Validate `data` under the configured mode.
    ///
    /// Strict mode returns violations as [`GuidelineError::Validation`];
    /// warning mode logs them and returns [`ValidationOutcome::Warned`].
    pub fn validate(&self, data: &Value, schema_name: &str, path: &Path) -> Result<ValidationOutcome> {
        if self.mode == ValidationMode::Disabled {
            return Ok(ValidationOutcome::Skipped);
        }
        if !self.validators.contains_key(schema_name) {
            return Ok(ValidationOutcome::Skipped);
        }

        match self.check(data, schema_name, path) {
            None => Ok(ValidationOutcome::Passed),
            Some(report) => match self.mode {
                ValidationMode::Warning => {
                    warn!("YAML Validation Warning: {report}");
                    Ok(ValidationOutcome::Warned(report))
                }
                _ => Err(GuidelineError::Validation(report)),
            },
        }
    }
}

/// Split a JSON pointer into unescaped segments
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

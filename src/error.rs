//! Error types for the guidelines content model

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::registry::EntityKind;
use crate::validator::ValidationReport;

/// Result type for content model operations
pub type Result<T> = std::result::Result<T, GuidelineError>;

/// Content model errors
#[derive(Error, Debug)]
pub enum GuidelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(ValidationReport),

    #[error("Duplicate {kind} ID: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("Duplicate {kind} sortKey: {key}")]
    DuplicateSortKey { kind: EntityKind, key: String },

    #[error("{kind} ID {id} referenced in {referenced_by} does not exist")]
    Reference {
        kind: EntityKind,
        id: String,
        referenced_by: String,
    },

    #[error("Invalid data: {0}")]
    Data(String),

    #[error("Failed to {operation} {}: {source}", .path.display())]
    FileOperation {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} not found: {}", .path.display())]
    ResourceNotFound { what: &'static str, path: PathBuf },

    #[error("Version error: {0}")]
    Version(String),

    #[error("YAML error in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("{label} failed ({primary}); fallback failed ({fallback})")]
    Fallback {
        label: String,
        primary: Box<GuidelineError>,
        fallback: Box<GuidelineError>,
    },

    #[error("Error with file {}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<GuidelineError>,
    },
}

/// Taxonomy bucket of an error, used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Data,
    FileOperation,
    ResourceNotFound,
    Version,
}

impl GuidelineError {
    /// Attach the offending source file, unless one is already attached
    pub fn in_file(self, path: impl AsRef<Path>) -> Self {
        match self {
            already @ GuidelineError::InFile { .. } => already,
            other => GuidelineError::InFile {
                path: path.as_ref().to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GuidelineError::Configuration(_) | GuidelineError::Config(_) => ErrorKind::Configuration,
            GuidelineError::Validation(_) => ErrorKind::Validation,
            GuidelineError::DuplicateId { .. }
            | GuidelineError::DuplicateSortKey { .. }
            | GuidelineError::Reference { .. }
            | GuidelineError::Data(_)
            | GuidelineError::Yaml { .. }
            | GuidelineError::Json { .. } => ErrorKind::Data,
            GuidelineError::FileOperation { .. } | GuidelineError::Git(_) => ErrorKind::FileOperation,
            GuidelineError::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            GuidelineError::Version(_) => ErrorKind::Version,
            GuidelineError::Fallback { primary, .. } => primary.kind(),
            GuidelineError::InFile { source, .. } => source.kind(),
        }
    }

    /// Multi-line report written to stderr before a fatal exit
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            GuidelineError::InFile { path, source } => {
                let mut diagnostic = source.diagnostic();
                if diagnostic.path.is_none() {
                    diagnostic.path = Some(path.clone());
                }
                diagnostic
            }
            GuidelineError::Validation(report) => Diagnostic {
                headline: "YAML validation failed".to_string(),
                path: Some(report.path.clone()),
                details: Some(report.to_string()),
            },
            GuidelineError::FileOperation {
                operation,
                path,
                source,
            } => Diagnostic {
                headline: format!("Failed to {operation} file"),
                path: Some(path.clone()),
                details: Some(source.to_string()),
            },
            GuidelineError::Yaml { path, source } => Diagnostic {
                headline: "YAML parse error".to_string(),
                path: Some(path.clone()),
                details: Some(source.to_string()),
            },
            GuidelineError::Json { path, source } => Diagnostic {
                headline: "JSON parse error".to_string(),
                path: Some(path.clone()),
                details: Some(source.to_string()),
            },
            GuidelineError::ResourceNotFound { what, path } => Diagnostic {
                headline: format!("{what} not found"),
                path: Some(path.clone()),
                details: None,
            },
            GuidelineError::Fallback {
                label,
                primary,
                fallback,
            } => Diagnostic {
                headline: format!("{label} could not be loaded"),
                path: None,
                details: Some(format!("primary: {primary}\nfallback: {fallback}")),
            },
            other => Diagnostic {
                headline: other.to_string(),
                path: None,
                details: None,
            },
        }
    }
}

/// User-visible error report: headline, offending file, details block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub headline: String,
    pub path: Option<PathBuf>,
    pub details: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline)?;
        if let Some(path) = &self.path {
            write!(f, "\nFile: {}", path.display())?;
        }
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_names_type_and_id() {
        let err = GuidelineError::DuplicateId {
            kind: EntityKind::Check,
            id: "0001".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate check ID: 0001");
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn in_file_keeps_innermost_path() {
        let err = GuidelineError::Data("bad".to_string())
            .in_file("data/yaml/faq/p0001.yaml")
            .in_file("ignored.yaml");
        let diagnostic = err.diagnostic();
        assert_eq!(diagnostic.path, Some(PathBuf::from("data/yaml/faq/p0001.yaml")));
        assert_eq!(diagnostic.headline, "Invalid data: bad");
    }

    #[test]
    fn diagnostic_renders_all_parts() {
        let diagnostic = Diagnostic {
            headline: "Failed to read file".to_string(),
            path: Some(PathBuf::from("version.py")),
            details: Some("permission denied".to_string()),
        };
        assert_eq!(
            diagnostic.to_string(),
            "Failed to read file\nFile: version.py\nDetails: permission denied"
        );
    }
}

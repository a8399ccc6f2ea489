//! Publication version information
//!
//! `version.py` at the repository root is a plain `KEY = "value"` file that
//! the documentation build and the check-sheet generator both read.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{GuidelineError, Result};

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^\s*(\w+)\s*=\s*["']([^"']*)["']\s*$"#).expect("valid regex"))
}

/// Parse the assignments of a version file's contents
pub fn parse_version_str(contents: &str) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for (lineno, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(caps) = assignment_pattern().captures(line) {
            values.insert(caps[1].to_string(), caps[2].to_string());
        } else if line.contains('=') {
            return Err(GuidelineError::Version(format!(
                "line {}: expected KEY = \"value\", got: {}",
                lineno + 1,
                trimmed
            )));
        }
    }
    Ok(values)
}

/// Read and parse a `version.py` file
pub fn parse_version_file(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Err(GuidelineError::ResourceNotFound {
            what: "Version file",
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| GuidelineError::FileOperation {
        operation: "read",
        path: path.to_path_buf(),
        source,
    })?;
    parse_version_str(&contents).map_err(|e| e.in_file(path))
}

/// Version and release date printed in the check-sheet header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub checksheet_version: String,
    pub checksheet_date: String,
}

impl VersionInfo {
    pub fn from_values(values: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            values
                .get(key)
                .cloned()
                .ok_or_else(|| GuidelineError::Version(format!("{key} is not defined")))
        };
        Ok(Self {
            checksheet_version: get("checksheet_version")?,
            checksheet_date: get("checksheet_date")?,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_values(&parse_version_file(path)?).map_err(|e| e.in_file(path))
    }

    /// Release date, when written as `YYYY-MM-DD` or `YYYY/MM/DD`
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.checksheet_date, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&self.checksheet_date, "%Y/%m/%d"))
            .ok()
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.checksheet_version, self.checksheet_date)
    }
}

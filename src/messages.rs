//! Localized label catalog
//!
//! Every table maps a label id to `{lang -> text}`. Lookups never fail: a
//! missing id or language yields the id itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::error;

use crate::error::{GuidelineError, Result};
use crate::recovery::with_fallback;

const BUILTIN_CATALOG: &str = include_str!("messages.toml");

/// Label id -> language -> text
pub type LabelTable = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCatalog {
    #[serde(default)]
    pub severity_tags: LabelTable,
    #[serde(default)]
    pub check_targets: LabelTable,
    #[serde(default)]
    pub check_tools: LabelTable,
    #[serde(default)]
    pub platform_names: LabelTable,
    #[serde(default)]
    pub implementation_targets: LabelTable,
    #[serde(default)]
    pub separators: LabelTable,
    #[serde(default)]
    pub conjunctions: LabelTable,
    #[serde(default)]
    pub pass_texts: LabelTable,
    #[serde(default)]
    pub date_formats: LabelTable,
    #[serde(default)]
    pub check_results: LabelTable,
    #[serde(default)]
    pub final_results: LabelTable,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lookup<'a>(table: &'a LabelTable, key: &'a str, lang: &str) -> &'a str {
    table
        .get(key)
        .and_then(|texts| texts.get(lang))
        .map(String::as_str)
        .unwrap_or(key)
}

impl MessageCatalog {
    /// Catalog with no labels; every lookup echoes its key
    pub fn empty() -> Self {
        Self {
            severity_tags: LabelTable::new(),
            check_targets: LabelTable::new(),
            check_tools: LabelTable::new(),
            platform_names: LabelTable::new(),
            implementation_targets: LabelTable::new(),
            separators: LabelTable::new(),
            conjunctions: LabelTable::new(),
            pass_texts: LabelTable::new(),
            date_formats: LabelTable::new(),
            check_results: LabelTable::new(),
            final_results: LabelTable::new(),
        }
    }

    /// The catalog compiled into the crate
    pub fn builtin() -> Self {
        match toml::from_str(BUILTIN_CATALOG) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!(error = %e, "built-in message catalog is malformed");
                Self::empty()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| GuidelineError::FileOperation {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| {
            GuidelineError::Configuration(format!("invalid message catalog {}: {e}", path.display()))
        })
    }

    /// User catalog when given and readable, the built-in catalog otherwise
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            None => Self::builtin(),
            Some(path) => with_fallback(
                || Self::from_file(path),
                || Ok(Self::builtin()),
                "message catalog",
            )
            .unwrap_or_else(|_| Self::builtin()),
        }
    }

    pub fn severity_tag<'a>(&'a self, severity: &'a str, lang: &str) -> &'a str {
        lookup(&self.severity_tags, severity, lang)
    }

    pub fn check_target<'a>(&'a self, target: &'a str, lang: &str) -> &'a str {
        lookup(&self.check_targets, target, lang)
    }

    pub fn check_tool<'a>(&'a self, tool: &'a str, lang: &str) -> &'a str {
        lookup(&self.check_tools, tool, lang)
    }

    pub fn platform_name<'a>(&'a self, platform: &'a str, lang: &str) -> &'a str {
        lookup(&self.platform_names, platform, lang)
    }

    pub fn implementation_target<'a>(&'a self, target: &'a str, lang: &str) -> &'a str {
        lookup(&self.implementation_targets, target, lang)
    }

    /// `text`, `list`, `and` or `or`
    pub fn separator<'a>(&'a self, kind: &'a str, lang: &str) -> &'a str {
        lookup(&self.separators, kind, lang)
    }

    pub fn conjunction<'a>(&'a self, kind: &'a str, lang: &str) -> &'a str {
        lookup(&self.conjunctions, kind, lang)
    }

    /// `singular` or `plural`
    pub fn pass_text<'a>(&'a self, kind: &'a str, lang: &str) -> &'a str {
        lookup(&self.pass_texts, kind, lang)
    }

    pub fn date_format<'a>(&'a self, lang: &str) -> &'a str {
        lookup(&self.date_formats, "default", lang)
    }

    /// `unchecked`, `pass` or `fail`
    pub fn check_result<'a>(&'a self, kind: &'a str, lang: &str) -> &'a str {
        lookup(&self.check_results, kind, lang)
    }

    /// `pass` or `fail`
    pub fn final_result<'a>(&'a self, kind: &'a str, lang: &str) -> &'a str {
        lookup(&self.final_results, kind, lang)
    }

    /// Platform ids rendered with localized names, joined by the list separator
    pub fn join_platforms(&self, platforms: &[String], lang: &str) -> String {
        platforms
            .iter()
            .map(|p| self.platform_name(p, lang))
            .collect::<Vec<_>>()
            .join(self.separator("list", lang))
    }
}

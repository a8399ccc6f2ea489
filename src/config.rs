//! Configuration management for the guidelines content model
//!
//! Supports loading configuration from:
//! - Default values
//! - Profile files (`profiles/default.toml`, `profiles/<profile>.toml`)
//! - Environment variables (A11Y_GL__*)
//! - Explicit overrides passed by the caller
//!
//! ## Example profile (profiles/default.toml):
//! ```toml
//! base_url = "https://a11y-guidelines.example.com"
//!
//! [languages]
//! available = ["ja", "en"]
//! default = "ja"
//!
//! [paths]
//! guidelines = "/categories/"
//! faq = "/faq/articles/"
//!
//! [validation]
//! yaml_validation = "warning"
//! ```
//!
//! Every API accepts an explicit [`Settings`] value; [`initialize`] and
//! [`current`] provide a process-wide handle for callers that want one.

use config_crate::{Config, Environment, File, Value as ConfigValue, ValueKind};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{GuidelineError, Result};
use crate::messages::MessageCatalog;
use crate::validator::ValidationMode;

/// Main settings object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Documentation root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Message catalog replacing the built-in labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_catalog: Option<PathBuf>,

    /// Available and default languages
    #[serde(default)]
    pub languages: LanguageSettings,

    /// Relative URL prefixes
    #[serde(default)]
    pub paths: PathSettings,

    /// Schema validation behaviour
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Locations inside the axe-core source tree
    #[serde(default)]
    pub axe_core: AxeCoreSettings,

    #[serde(skip)]
    pub messages: MessageCatalog,
}

/// Language configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSettings {
    #[serde(default = "default_languages")]
    pub available: Vec<String>,

    #[serde(default = "default_language")]
    pub default: String,
}

/// URL path prefixes; each must start and end with `/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_guidelines_path")]
    pub guidelines: String,

    #[serde(default = "default_faq_path")]
    pub faq: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default)]
    pub yaml_validation: ValidationMode,
}

/// axe-core source tree layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxeCoreSettings {
    #[serde(default = "default_axe_submodule")]
    pub submodule_name: String,

    #[serde(default = "default_axe_submodule")]
    pub base_dir: String,

    #[serde(default = "default_deque_url")]
    pub deque_url: String,

    #[serde(default = "default_pkg_file")]
    pub pkg_file: String,

    #[serde(default = "default_rules_dir")]
    pub rules_dir: String,

    #[serde(default = "default_locale_dir")]
    pub locale_dir: String,

    #[serde(default = "default_locale_ja_file")]
    pub locale_ja_file: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://a11y-guidelines.freee.co.jp".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["ja".to_string(), "en".to_string()]
}

fn default_language() -> String {
    "ja".to_string()
}

fn default_guidelines_path() -> String {
    "/categories/".to_string()
}

fn default_faq_path() -> String {
    "/faq/articles/".to_string()
}

fn default_axe_submodule() -> String {
    "vendor/axe-core".to_string()
}

fn default_deque_url() -> String {
    "https://dequeuniversity.com/rules/axe/".to_string()
}

fn default_pkg_file() -> String {
    "package.json".to_string()
}

fn default_rules_dir() -> String {
    "lib/rules".to_string()
}

fn default_locale_dir() -> String {
    "locales".to_string()
}

fn default_locale_ja_file() -> String {
    "ja.json".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            message_catalog: None,
            languages: LanguageSettings::default(),
            paths: PathSettings::default(),
            validation: ValidationSettings::default(),
            axe_core: AxeCoreSettings::default(),
            messages: MessageCatalog::builtin(),
        }
    }
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            available: default_languages(),
            default: default_language(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            guidelines: default_guidelines_path(),
            faq: default_faq_path(),
        }
    }
}

impl Default for AxeCoreSettings {
    fn default() -> Self {
        Self {
            submodule_name: default_axe_submodule(),
            base_dir: default_axe_submodule(),
            deque_url: default_deque_url(),
            pkg_file: default_pkg_file(),
            rules_dir: default_rules_dir(),
            locale_dir: default_locale_dir(),
            locale_ja_file: default_locale_ja_file(),
        }
    }
}

/// Default configuration directory for profiles and message catalogs
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "a11y-guidelines").map(|dirs| dirs.config_dir().to_path_buf())
}

impl Settings {
    /// Load settings from the default configuration directory
    pub fn load(profile: Option<&str>, overrides: Option<&serde_json::Value>) -> Result<Self> {
        Self::load_from(config_dir().as_deref(), profile, overrides)
    }

    /// Load settings with an explicit configuration directory
    pub fn load_from(
        config_dir: Option<&Path>,
        profile: Option<&str>,
        overrides: Option<&serde_json::Value>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(dir) = config_dir {
            let profiles = dir.join("profiles");
            builder = builder.add_source(File::from(profiles.join("default.toml")).required(false));
            if let Some(name) = profile.filter(|name| *name != "default") {
                builder = builder
                    .add_source(File::from(profiles.join(format!("{name}.toml"))).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("A11Y_GL").separator("__"));

        if let Some(overrides) = overrides {
            let mut flat = Vec::new();
            flatten_overrides("", overrides, &mut flat)?;
            for (key, value) in flat {
                builder = builder.set_override(key, value)?;
            }
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.messages = MessageCatalog::load(settings.message_catalog.as_deref());
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints the serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        if self.languages.available.is_empty() {
            return Err(GuidelineError::Configuration(
                "languages.available must list at least one language".to_string(),
            ));
        }
        if !self.languages.available.contains(&self.languages.default) {
            return Err(GuidelineError::Configuration(format!(
                "default language '{}' is not one of {:?}",
                self.languages.default, self.languages.available
            )));
        }
        if self.base_url.is_empty() {
            return Err(GuidelineError::Configuration("base_url cannot be empty".to_string()));
        }
        for (key, path) in [("paths.guidelines", &self.paths.guidelines), ("paths.faq", &self.paths.faq)] {
            if path.is_empty() || !path.starts_with('/') || !path.ends_with('/') {
                return Err(GuidelineError::Configuration(format!(
                    "{key} must start and end with '/', got '{path}'"
                )));
            }
        }
        Ok(())
    }

    pub fn languages(&self) -> &[String] {
        &self.languages.available
    }

    pub fn default_language(&self) -> &str {
        &self.languages.default
    }

    pub fn is_default_language(&self, lang: &str) -> bool {
        lang == self.languages.default
    }

    /// Fails with a configuration error for languages that are not configured
    pub fn check_language(&self, lang: &str) -> Result<()> {
        if self.languages.available.iter().any(|l| l == lang) {
            Ok(())
        } else {
            Err(GuidelineError::Configuration(format!("unknown language: {lang}")))
        }
    }

    /// Base URL with the language suffix (`""` for the default language)
    pub fn base_url_for(&self, lang: &str) -> String {
        if self.is_default_language(lang) {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, lang)
        }
    }

    pub fn guidelines_path(&self) -> &str {
        &self.paths.guidelines
    }

    pub fn faq_path(&self) -> &str {
        &self.paths.faq
    }

    /// URL of the per-tool example pages
    pub fn examples_url(&self, lang: &str) -> String {
        format!("{}/checks/examples/", self.base_url_for(lang))
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.validation.yaml_validation
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GuidelineError::Configuration(format!("cannot render settings: {e}")))
    }
}

fn flatten_overrides(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut Vec<(String, ConfigValue)>,
) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_overrides(&path, child, out)?;
            }
            Ok(())
        }
        _ if prefix.is_empty() => Err(GuidelineError::Configuration(
            "overrides must be a JSON object".to_string(),
        )),
        serde_json::Value::Null => Ok(()),
        leaf => {
            out.push((prefix.to_string(), to_config_value(leaf)));
            Ok(())
        }
    }
}

fn to_config_value(value: &serde_json::Value) -> ConfigValue {
    match value {
        serde_json::Value::Null => ConfigValue::from(ValueKind::Nil),
        serde_json::Value::Bool(b) => ConfigValue::from(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::from(i),
            None => ConfigValue::from(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => ConfigValue::from(s.clone()),
        serde_json::Value::Array(items) => {
            ConfigValue::from(items.iter().map(to_config_value).collect::<Vec<_>>())
        }
        serde_json::Value::Object(map) => ConfigValue::from(
            map.iter()
                .map(|(k, v)| (k.clone(), to_config_value(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

struct Installed {
    profile: Option<String>,
    overrides: Option<serde_json::Value>,
    settings: Arc<Settings>,
}

static GLOBAL: RwLock<Option<Installed>> = RwLock::new(None);

/// Install process-wide settings.
///
/// Repeated calls with equal arguments keep the installed settings; calls
/// with different arguments replace them.
pub fn initialize(profile: Option<&str>, overrides: Option<&serde_json::Value>) -> Result<Arc<Settings>> {
    {
        let guard = GLOBAL.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(installed) = guard.as_ref() {
            if installed.profile.as_deref() == profile && installed.overrides.as_ref() == overrides {
                return Ok(Arc::clone(&installed.settings));
            }
        }
    }

    let settings = Arc::new(Settings::load(profile, overrides)?);
    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Installed {
        profile: profile.map(str::to_string),
        overrides: overrides.cloned(),
        settings: Arc::clone(&settings),
    });
    Ok(settings)
}

/// Installed settings, or defaults before [`initialize`] has run
pub fn current() -> Arc<Settings> {
    let guard = GLOBAL.read().unwrap_or_else(PoisonError::into_inner);
    match guard.as_ref() {
        Some(installed) => Arc::clone(&installed.settings),
        None => Arc::new(Settings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let settings = Settings::default();
        assert_eq!(settings.languages(), ["ja".to_string(), "en".to_string()]);
        assert_eq!(settings.default_language(), "ja");
        assert_eq!(settings.guidelines_path(), "/categories/");
        assert_eq!(settings.faq_path(), "/faq/articles/");
        assert_eq!(settings.validation_mode(), ValidationMode::Strict);
        assert_eq!(settings.axe_core.rules_dir, "lib/rules");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_base_url_language_suffix() {
        let settings = Settings::default();
        assert_eq!(settings.base_url_for("ja"), "https://a11y-guidelines.freee.co.jp");
        assert_eq!(settings.base_url_for("en"), "https://a11y-guidelines.freee.co.jp/en");
        assert_eq!(
            settings.examples_url("en"),
            "https://a11y-guidelines.freee.co.jp/en/checks/examples/"
        );
    }

    #[test]
    fn test_profile_file_and_overrides() {
        let dir = TempDir::new().unwrap();
        let profiles = dir.path().join("profiles");
        std::fs::create_dir_all(&profiles).unwrap();
        std::fs::write(
            profiles.join("staging.toml"),
            "base_url = \"https://staging.example.com\"\n[validation]\nyaml_validation = \"warning\"\n",
        )
        .unwrap();

        let overrides = json!({ "paths": { "faq": "/questions/" } });
        let settings = Settings::load_from(Some(dir.path()), Some("staging"), Some(&overrides)).unwrap();

        assert_eq!(settings.base_url, "https://staging.example.com");
        assert_eq!(settings.validation_mode(), ValidationMode::Warning);
        assert_eq!(settings.faq_path(), "/questions/");
        assert_eq!(settings.guidelines_path(), "/categories/");
    }

    #[test]
    fn test_invalid_path_rejected() {
        let overrides = json!({ "paths": { "guidelines": "categories/" } });
        let err = Settings::load_from(None, None, Some(&overrides)).unwrap_err();
        assert!(matches!(err, GuidelineError::Configuration(_)));
    }

    #[test]
    fn test_unknown_default_language_rejected() {
        let overrides = json!({ "languages": { "default": "fr" } });
        let err = Settings::load_from(None, None, Some(&overrides)).unwrap_err();
        assert!(err.to_string().contains("fr"));
    }

    #[test]
    fn test_unknown_validation_mode_rejected() {
        let overrides = json!({ "validation": { "yaml_validation": "lenient" } });
        assert!(Settings::load_from(None, None, Some(&overrides)).is_err());
    }

    #[test]
    fn test_to_toml_round_trip() {
        let settings = Settings::default();
        let rendered = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.base_url, settings.base_url);
        assert_eq!(parsed.axe_core, settings.axe_core);
    }
}

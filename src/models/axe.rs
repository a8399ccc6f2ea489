//! axe-core rules mapped into the guideline graph

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::localized::Localized;
use crate::models::{CategoryAndId, Guideline, WcagSc, WcagScTemplate};
use crate::registry::{Entity, EntityKey, EntityKind};

fn wcag_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^wcag\d{3,5}$").expect("valid regex"))
}

fn tag2sc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^wcag(\d)(\d)(\d{1,3})$").expect("valid regex"))
}

/// Map an axe-core tag such as `wcag1410` to a success criterion id (`1.4.10`).
/// Other strings are returned unchanged.
pub fn tag2sc(tag: &str) -> String {
    tag2sc_pattern().replace(tag, "$1.$2.$3").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AxeRuleMetadata {
    pub help: String,
    pub description: String,
}

/// A rule file from `lib/rules/*.json`; other fields are ignored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AxeRuleData {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub metadata: AxeRuleMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AxeLocaleMessage {
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Translated rule messages from `locales/<lang>.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AxeLocale {
    #[serde(default)]
    pub rules: BTreeMap<String, AxeLocaleMessage>,
}

/// Version information of the axe-core tree the rules were read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxeMetadata {
    pub version: String,
    /// `major.minor`, used in Deque University URLs
    pub major_version: String,
    pub deque_url: String,
    /// Commit time of the pinned axe-core revision
    pub timestamp: Option<String>,
}

impl AxeMetadata {
    pub fn new(version: &str, deque_url: &str, timestamp: Option<String>) -> Self {
        let major_version = match semver::Version::parse(version.trim_start_matches('v')) {
            Ok(parsed) => format!("{}.{}", parsed.major, parsed.minor),
            Err(_) => version.split('.').take(2).collect::<Vec<_>>().join("."),
        };
        Self {
            version: version.to_string(),
            major_version,
            deque_url: deque_url.to_string(),
            timestamp,
        }
    }

    /// Deque University page of a rule for this axe-core release
    pub fn rule_url(&self, rule_id: &str) -> String {
        format!("{}{}/{}", self.deque_url, self.major_version, rule_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxeRule {
    pub id: String,
    pub help: Localized,
    pub description: Localized,
    /// Whether the Japanese locale catalog has messages for this rule
    pub translated: bool,
    pub has_wcag_sc: bool,
    pub has_guideline: bool,
}

impl Entity for AxeRule {
    const KIND: EntityKind = EntityKind::AxeRule;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxeRuleTemplate {
    pub id: String,
    pub help: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub translated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scs: Option<Vec<WcagScTemplate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<Vec<CategoryAndId>>,
}

impl AxeRule {
    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> AxeRuleTemplate {
        let key = self.key();
        let scs = self.has_wcag_sc.then(|| {
            corpus
                .related_sorted::<WcagSc>(&key)
                .into_iter()
                .map(WcagSc::template_data)
                .collect()
        });
        let guidelines = self.has_guideline.then(|| {
            corpus
                .related_sorted::<Guideline>(&key)
                .into_iter()
                .map(|gl| gl.category_and_id(corpus, lang))
                .collect()
        });
        AxeRuleTemplate {
            id: self.id.clone(),
            help: self.help.text(lang).to_string(),
            description: self.description.text(lang).to_string(),
            translated: self.translated,
            scs,
            guidelines,
        }
    }
}

impl Corpus {
    /// Register a rule and link it to the success criteria named by its tags
    /// and, through them, to guidelines
    pub fn add_axe_rule(&mut self, rule: AxeRuleData, locale_ja: &AxeLocale) -> Result<EntityKey> {
        let translation = locale_ja.rules.get(&rule.id);
        let ja_help = translation
            .and_then(|msg| msg.help.clone())
            .unwrap_or_else(|| rule.metadata.help.clone());
        let ja_description = translation
            .and_then(|msg| msg.description.clone())
            .unwrap_or_else(|| rule.metadata.description.clone());

        let key = EntityKey::new(EntityKind::AxeRule, rule.id.clone());
        let mut scs: Vec<EntityKey> = Vec::new();
        let mut guidelines: Vec<EntityKey> = Vec::new();
        for tag in rule.tags.iter().filter(|tag| wcag_tag_pattern().is_match(tag)) {
            let Some(sc) = self.wcag_scs.get(&tag2sc(tag)) else {
                continue;
            };
            let sc_key = sc.key();
            guidelines.extend(
                self.relationships
                    .related(&sc_key, EntityKind::Guideline)
                    .into_iter()
                    .cloned(),
            );
            scs.push(sc_key);
        }

        let help: Localized = [("en", rule.metadata.help), ("ja", ja_help)].into_iter().collect();
        let description: Localized = [("en", rule.metadata.description), ("ja", ja_description)]
            .into_iter()
            .collect();
        let rule = AxeRule {
            help: self.localize(help),
            description: self.localize(description),
            id: rule.id,
            translated: translation.is_some(),
            has_wcag_sc: !scs.is_empty(),
            has_guideline: !guidelines.is_empty(),
        };
        self.axe_rules.insert(rule)?;

        for other in scs.iter().chain(&guidelines) {
            self.associate(&key, other);
        }
        Ok(key)
    }

    pub(crate) fn set_axe_metadata(&mut self, metadata: AxeMetadata) {
        self.axe_metadata = Some(metadata);
    }

    /// Rules linked to guidelines, then rules linked only to success
    /// criteria, then the rest; each group ordered by id
    pub fn axe_rules_listed(&self) -> Vec<&AxeRule> {
        let mut rules: Vec<&AxeRule> = self.axe_rules.iter().collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules.sort_by_key(|rule| match (rule.has_guideline, rule.has_wcag_sc) {
            (true, _) => 0,
            (false, true) => 1,
            (false, false) => 2,
        });
        rules
    }
}

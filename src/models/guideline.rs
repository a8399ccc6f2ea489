use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::corpus::Corpus;
use crate::error::{GuidelineError, Result};
use crate::localized::Localized;
use crate::models::{Category, CategoryAndId, Check, CheckTemplate, Faq, InfoRef, LinkData, WcagSc, WcagScTemplate};
use crate::registry::{Entity, EntityKey, EntityKind, SortKey};

/// A guideline document as read from `data/yaml/gl/<category>/<id>.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineData {
    pub id: String,
    #[serde(rename = "sortKey")]
    pub sort_key: SortKey,
    pub category: String,
    pub platform: Vec<String>,
    pub title: Localized,
    pub guideline: Localized,
    pub intent: Localized,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub sc: Vec<String>,
    #[serde(default)]
    pub info: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guideline {
    pub id: String,
    pub sort_key: SortKey,
    pub category: String,
    pub platform: Vec<String>,
    pub title: Localized,
    pub guideline: Localized,
    pub intent: Localized,
    pub src_path: PathBuf,
}

impl Entity for Guideline {
    const KIND: EntityKind = EntityKind::Guideline;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> SortKey {
        self.sort_key.clone()
    }

    fn src_path(&self) -> Option<&Path> {
        Some(&self.src_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidelineTemplate {
    pub id: String,
    pub title: String,
    pub platform: String,
    pub guideline: String,
    pub intent: String,
    pub category: String,
    pub checks: Vec<CheckTemplate>,
    pub scs: Vec<WcagScTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faqs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Vec<String>>,
}

impl Guideline {
    fn category_name<'a>(&self, corpus: &'a Corpus, lang: &str) -> &'a str {
        corpus
            .get::<Category>(&self.category)
            .map(|category| category.get_name(lang))
            .unwrap_or_default()
    }

    pub fn category_and_id(&self, corpus: &Corpus, lang: &str) -> CategoryAndId {
        CategoryAndId {
            category: self.category_name(corpus, lang).to_string(),
            guideline: self.id.clone(),
        }
    }

    /// Link to the guideline's anchor on its category page
    pub fn link_data(&self, corpus: &Corpus) -> LinkData {
        let settings = corpus.settings();
        let mut text = Localized::new();
        let mut url = Localized::new();
        for (lang, title) in self.title.iter() {
            let separator = corpus.messages().separator("text", lang);
            text.insert(lang, format!("{}{separator}{title}", self.category_name(corpus, lang)));
            url.insert(
                lang,
                format!(
                    "{}{}{}.html#{}",
                    settings.base_url_for(lang),
                    settings.guidelines_path(),
                    self.category,
                    self.id
                ),
            );
        }
        LinkData { text, url }
    }

    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> GuidelineTemplate {
        let key = self.key();

        let mut checks = corpus.related::<Check>(&key);
        checks.sort_by(|a, b| a.id.cmp(&b.id));

        let faqs: Vec<String> = corpus
            .related_sorted::<Faq>(&key)
            .into_iter()
            .map(|faq| faq.id.clone())
            .collect();
        let info: Vec<String> = corpus
            .related::<InfoRef>(&key)
            .into_iter()
            .map(InfoRef::refstring)
            .collect();

        GuidelineTemplate {
            id: self.id.clone(),
            title: self.title.text(lang).to_string(),
            platform: corpus.messages().join_platforms(&self.platform, lang),
            guideline: self.guideline.text(lang).to_string(),
            intent: self.intent.text(lang).to_string(),
            category: self.category_name(corpus, lang).to_string(),
            checks: checks
                .into_iter()
                .map(|check| check.template_data(corpus, lang, Some(&self.platform)))
                .collect(),
            scs: corpus
                .related_sorted::<WcagSc>(&key)
                .into_iter()
                .map(WcagSc::template_data)
                .collect(),
            faqs: (!faqs.is_empty()).then_some(faqs),
            info: (!info.is_empty()).then_some(info),
        }
    }
}

impl Corpus {
    /// Register a guideline and link it to its category, checks, success
    /// criteria and references. Everything it names must already be loaded.
    pub fn add_guideline(&mut self, data: GuidelineData, src_path: &Path) -> Result<EntityKey> {
        let referenced_by = format!("guideline {}", data.id);
        if !self.categories.contains(&data.category) {
            return Err(GuidelineError::Reference {
                kind: EntityKind::Category,
                id: data.category,
                referenced_by,
            });
        }
        if let Some(missing) = data.checks.iter().find(|id| !self.checks.contains(id)) {
            return Err(GuidelineError::Reference {
                kind: EntityKind::Check,
                id: missing.clone(),
                referenced_by,
            });
        }
        if let Some(missing) = data.sc.iter().find(|id| !self.wcag_scs.contains(id)) {
            return Err(GuidelineError::Reference {
                kind: EntityKind::WcagSc,
                id: missing.clone(),
                referenced_by,
            });
        }

        let guideline = Guideline {
            id: data.id,
            sort_key: data.sort_key,
            category: data.category,
            platform: data.platform,
            title: self.localize(data.title),
            guideline: self.localize(data.guideline),
            intent: self.localize(data.intent),
            src_path: src_path.to_path_buf(),
        };
        let key = guideline.key();
        let category = EntityKey::new(EntityKind::Category, guideline.category.clone());
        self.guidelines.insert(guideline)?;

        self.associate(&key, &category);
        let checks: Vec<EntityKey> = data
            .checks
            .into_iter()
            .map(|id| EntityKey::new(EntityKind::Check, id))
            .collect();
        for check in &checks {
            self.associate(&key, check);
        }
        for sc in data.sc {
            self.associate(&key, &EntityKey::new(EntityKind::WcagSc, sc));
        }
        for reference in data.info {
            let info = self.add_info_ref(&reference)?;
            self.associate(&key, &info);
            for check in &checks {
                self.associate(check, &info);
            }
        }
        Ok(key)
    }

    /// Source files of every guideline, in load order
    pub fn guideline_src_paths(&self) -> Vec<&Path> {
        self.guidelines.iter().map(|gl| gl.src_path.as_path()).collect()
    }
}

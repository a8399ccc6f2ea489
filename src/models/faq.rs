//! FAQ articles

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use crate::corpus::Corpus;
use crate::error::{GuidelineError, Result};
use crate::localized::Localized;
use crate::models::{CategoryAndId, Check, CheckTemplate, FaqTag, Guideline, InfoRef, LinkData};
use crate::registry::{Entity, EntityKey, EntityKind, SortKey};

/// An article as read from `data/yaml/faq/<id>.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqData {
    pub id: String,
    #[serde(rename = "sortKey")]
    pub sort_key: SortKey,
    /// ISO 8601 date, optionally with a time
    pub updated: String,
    pub title: Localized,
    pub problem: Localized,
    pub solution: Localized,
    pub explanation: Localized,
    pub tags: Vec<String>,
    #[serde(default)]
    pub guidelines: Vec<String>,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub info: Vec<String>,
    /// Related articles; may name articles loaded later
    #[serde(default)]
    pub faqs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faq {
    pub id: String,
    pub sort_key: SortKey,
    pub updated: NaiveDateTime,
    pub title: Localized,
    pub problem: Localized,
    pub solution: Localized,
    pub explanation: Localized,
    pub src_path: PathBuf,
}

impl Entity for Faq {
    const KIND: EntityKind = EntityKind::Faq;

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

/// Ordering of [`Corpus::faqs_sorted`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaqSort {
    #[default]
    SortKey,
    /// Most recently updated first
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqTemplate {
    pub id: String,
    pub title: String,
    pub problem: String,
    pub solution: String,
    pub explanation: String,
    pub updated_str: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<Vec<CategoryAndId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<CheckTemplate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_faqs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Vec<String>>,
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]`
pub(crate) fn parse_updated(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

impl Faq {
    pub fn link_data(&self, corpus: &Corpus) -> LinkData {
        let settings = corpus.settings();
        let mut url = Localized::new();
        for lang in self.title.languages() {
            url.insert(
                lang,
                format!("{}{}{}.html", settings.base_url_for(lang), settings.faq_path(), self.id),
            );
        }
        LinkData {
            text: self.title.clone(),
            url,
        }
    }

    /// `updated` rendered with the catalog's date format for `lang`
    pub fn updated_str(&self, corpus: &Corpus, lang: &str) -> String {
        self.updated.format(corpus.messages().date_format(lang)).to_string()
    }

    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> FaqTemplate {
        let key = self.key();

        let guidelines: Vec<CategoryAndId> = corpus
            .related_sorted::<Guideline>(&key)
            .into_iter()
            .map(|gl| gl.category_and_id(corpus, lang))
            .collect();
        let checks: Vec<CheckTemplate> = corpus
            .related_sorted_by::<Check, _, _>(&key, |check| check.id.clone())
            .into_iter()
            .map(|check| check.template_data(corpus, lang, None))
            .collect();
        let related_faqs: Vec<String> = corpus
            .related_sorted::<Faq>(&key)
            .into_iter()
            .map(|faq| faq.id.clone())
            .collect();
        let info: Vec<String> = corpus
            .related::<InfoRef>(&key)
            .into_iter()
            .map(InfoRef::refstring)
            .collect();

        FaqTemplate {
            id: self.id.clone(),
            title: self.title.text(lang).to_string(),
            problem: self.problem.text(lang).to_string(),
            solution: self.solution.text(lang).to_string(),
            explanation: self.explanation.text(lang).to_string(),
            updated_str: self.updated_str(corpus, lang),
            tags: corpus
                .related::<FaqTag>(&key)
                .into_iter()
                .map(|tag| tag.id.clone())
                .collect(),
            guidelines: (!guidelines.is_empty()).then_some(guidelines),
            checks: (!checks.is_empty()).then_some(checks),
            related_faqs: (!related_faqs.is_empty()).then_some(related_faqs),
            info: (!info.is_empty()).then_some(info),
        }
    }

    /// The article's own file plus those of its guidelines and checks
    pub fn dependencies(&self, corpus: &Corpus) -> Vec<PathBuf> {
        let key = self.key();
        let mut paths = vec![self.src_path.clone()];
        let related = corpus
            .related::<Guideline>(&key)
            .into_iter()
            .map(|gl| gl.src_path.as_path())
            .chain(corpus.related::<Check>(&key).into_iter().map(|check| check.src_path.as_path()));
        for path in related {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_path_buf());
            }
        }
        paths
    }
}

impl Corpus {
    /// Register an article. Tags, guidelines and checks must already be
    /// loaded; related articles are recorded as pending pairs.
    pub fn add_faq(&mut self, data: FaqData, src_path: &Path) -> Result<EntityKey> {
        let referenced_by = format!("faq {}", data.id);
        let missing = [
            (EntityKind::FaqTag, data.tags.iter().find(|id| !self.faq_tags.contains(id))),
            (EntityKind::Guideline, data.guidelines.iter().find(|id| !self.guidelines.contains(id))),
            (EntityKind::Check, data.checks.iter().find(|id| !self.checks.contains(id))),
        ];
        if let Some((kind, Some(id))) = missing.into_iter().find(|(_, id)| id.is_some()) {
            return Err(GuidelineError::Reference {
                kind,
                id: id.clone(),
                referenced_by,
            });
        }

        let updated = parse_updated(&data.updated).ok_or_else(|| {
            GuidelineError::Data(format!("faq {}: invalid updated date '{}'", data.id, data.updated))
        })?;

        let faq = Faq {
            id: data.id,
            sort_key: data.sort_key,
            updated,
            title: self.localize(data.title),
            problem: self.localize(data.problem),
            solution: self.localize(data.solution),
            explanation: self.localize(data.explanation),
            src_path: src_path.to_path_buf(),
        };
        let key = faq.key();
        self.faqs.insert(faq)?;

        for tag in data.tags {
            self.associate(&key, &EntityKey::new(EntityKind::FaqTag, tag));
        }
        for guideline in data.guidelines {
            self.associate(&key, &EntityKey::new(EntityKind::Guideline, guideline));
        }
        for check in data.checks {
            self.associate(&key, &EntityKey::new(EntityKind::Check, check));
        }
        for reference in data.info {
            let info = self.add_info_ref(&reference)?;
            self.associate(&key, &info);
        }
        for other in data.faqs {
            self.relationships.add_unresolved_faq_pair(&key.id, &other);
        }
        Ok(key)
    }

    /// All articles, by sort key or newest first
    pub fn faqs_sorted(&self, sort: FaqSort) -> Vec<&Faq> {
        match sort {
            FaqSort::SortKey => self.faqs.all(),
            FaqSort::Date => {
                let mut faqs: Vec<&Faq> = self.faqs.iter().collect();
                faqs.sort_by_key(|faq| Reverse(faq.updated));
                faqs
            }
        }
    }

    pub fn faq_src_paths(&self) -> Vec<&Path> {
        self.faqs.iter().map(|faq| faq.src_path.as_path()).collect()
    }
}

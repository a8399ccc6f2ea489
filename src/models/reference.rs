//! WCAG success criteria and supplemental-reading references

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::localized::Localized;
use crate::models::{Faq, Guideline, LinkData};
use crate::registry::{Entity, EntityKey, EntityKind, SortKey};

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    A,
    AA,
    AAA,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::A => "A",
            Level::AA => "AA",
            Level::AAA => "AAA",
        })
    }
}

/// Per-language title and URL of a success criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScText {
    pub title: String,
    pub url: String,
}

/// One entry of `wcag-sc.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WcagScRecord {
    pub id: String,
    #[serde(rename = "sortKey")]
    pub sort_key: SortKey,
    pub level: Level,
    #[serde(rename = "localPriority")]
    pub local_priority: Level,
    #[serde(flatten)]
    pub texts: BTreeMap<String, ScText>,
}

/// A WCAG 2.x success criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WcagSc {
    pub id: String,
    /// Criterion number as published, e.g. `1.4.3`
    pub scnum: String,
    pub sort_key: SortKey,
    pub level: Level,
    pub local_priority: Level,
    pub title: Localized,
    pub url: Localized,
}

impl Entity for WcagSc {
    const KIND: EntityKind = EntityKind::WcagSc;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> SortKey {
        self.sort_key.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WcagScTemplate {
    pub sc: String,
    pub level: Level,
    #[serde(rename = "LocalLevel")]
    pub local_level: Level,
    pub sc_en_title: String,
    pub sc_ja_title: String,
    pub sc_en_url: String,
    pub sc_ja_url: String,
}

impl WcagSc {
    pub fn template_data(&self) -> WcagScTemplate {
        WcagScTemplate {
            sc: self.scnum.clone(),
            level: self.level,
            local_level: self.local_priority,
            sc_en_title: self.title.text("en").to_string(),
            sc_ja_title: self.title.text("ja").to_string(),
            sc_en_url: self.url.text("en").to_string(),
            sc_ja_url: self.url.text("ja").to_string(),
        }
    }
}

fn external_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(https?://|\|.+\|)").expect("valid regex"))
}

/// Supplemental-reading reference: an external URL or an internal document label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRef {
    /// URL-encoded reference
    pub id: String,
    pub reference: String,
    pub internal: bool,
    link: Option<LinkData>,
}

impl Entity for InfoRef {
    const KIND: EntityKind = EntityKind::InfoRef;

    fn id(&self) -> &str {
        &self.id
    }
}

impl InfoRef {
    pub fn new(reference: &str) -> Self {
        Self {
            id: InfoRef::id_for(reference),
            reference: reference.to_string(),
            internal: !external_ref_pattern().is_match(reference),
            link: None,
        }
    }

    pub fn id_for(reference: &str) -> String {
        urlencoding::encode(reference).into_owned()
    }

    /// Markup used to cite the reference in generated documents
    pub fn refstring(&self) -> String {
        if self.internal {
            format!(":ref:`{}`", self.reference)
        } else {
            self.reference.clone()
        }
    }

    /// Link text and URL, once known
    pub fn link_data(&self) -> Option<&LinkData> {
        self.link.as_ref()
    }

    /// Attach the resolved link of an internal reference; external links are fixed at load
    pub fn set_link(&mut self, link: LinkData) -> bool {
        if self.internal {
            self.link = Some(link);
            true
        } else {
            false
        }
    }
}

impl Corpus {
    pub fn add_wcag_sc(&mut self, id: &str, record: WcagScRecord) -> Result<&WcagSc> {
        let mut title = Localized::new();
        let mut url = Localized::new();
        for (lang, text) in record.texts {
            title.insert(lang.clone(), text.title);
            url.insert(lang, text.url);
        }
        let title = self.localize(title);
        let url = self.localize(url);
        self.wcag_scs.insert(WcagSc {
            id: id.to_string(),
            scnum: record.id,
            sort_key: record.sort_key,
            level: record.level,
            local_priority: record.local_priority,
            title,
            url,
        })
    }

    /// Key of the InfoRef for `reference`, registering it on first use
    pub fn add_info_ref(&mut self, reference: &str) -> Result<EntityKey> {
        let id = InfoRef::id_for(reference);
        if !self.info_refs.contains(&id) {
            self.info_refs.insert(InfoRef::new(reference))?;
        }
        Ok(EntityKey::new(EntityKind::InfoRef, id))
    }

    /// Register an external reference together with its link from `info.json`
    pub fn add_external_info(&mut self, reference: &str, link: LinkData) -> Result<EntityKey> {
        let key = self.add_info_ref(reference)?;
        let link = LinkData {
            text: self.localize(link.text),
            url: self.localize(link.url),
        };
        if let Some(info) = self.info_refs.get_mut(&key.id) {
            if !info.internal && info.link.is_none() {
                info.link = Some(link);
            }
        }
        Ok(key)
    }

    /// Set the link of an internal reference; returns whether one was updated
    pub fn set_info_link(&mut self, id: &str, link: LinkData) -> bool {
        self.info_refs.get_mut(id).is_some_and(|info| info.set_link(link))
    }

    pub fn external_info_refs(&self) -> Vec<&InfoRef> {
        self.info_refs.iter().filter(|info| !info.internal).collect()
    }

    pub fn info_refs_with_guidelines(&self) -> Vec<&InfoRef> {
        self.info_refs
            .iter()
            .filter(|info| !self.related::<Guideline>(&info.key()).is_empty())
            .collect()
    }

    pub fn info_refs_with_faqs(&self) -> Vec<&InfoRef> {
        self.info_refs
            .iter()
            .filter(|info| !self.related::<Faq>(&info.key()).is_empty())
            .collect()
    }

    /// Internal references that never received a link
    pub fn unresolved_info_refs(&self) -> Vec<&InfoRef> {
        self.info_refs
            .iter()
            .filter(|info| info.internal && info.link.is_none())
            .collect()
    }
}

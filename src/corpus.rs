//! The loaded guidelines corpus
//!
//! A [`Corpus`] owns one [`Registry`] per entity type and the
//! [`RelationshipManager`] linking them. It is built by
//! [`Corpus::initialize`](crate::loader) and read-only afterwards: every
//! query hands out shared borrows, so consumers cannot mutate registries or
//! relationships while iterating over them.

use std::collections::HashSet;

use crate::config::Settings;
use crate::error::{GuidelineError, Result};
use crate::localized::Localized;
use crate::messages::MessageCatalog;
use crate::models::{
    AxeMetadata, AxeRule, Category, Check, CheckTool, Faq, FaqTag, Guideline, InfoRef, WcagSc,
};
use crate::registry::{Entity, EntityKey, EntityKind, Registry};
use crate::relationship::RelationshipManager;

/// Entity types stored in a [`Corpus`]
pub trait Stored: Entity + Sized {
    fn registry(corpus: &Corpus) -> &Registry<Self>;
}

macro_rules! stored {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Stored for $ty {
                fn registry(corpus: &Corpus) -> &Registry<Self> {
                    &corpus.$field
                }
            }
        )*
    };
}

stored! {
    Category => categories,
    WcagSc => wcag_scs,
    InfoRef => info_refs,
    Guideline => guidelines,
    Check => checks,
    CheckTool => check_tools,
    Faq => faqs,
    FaqTag => faq_tags,
    AxeRule => axe_rules,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    settings: Settings,
    pub(crate) categories: Registry<Category>,
    pub(crate) wcag_scs: Registry<WcagSc>,
    pub(crate) info_refs: Registry<InfoRef>,
    pub(crate) guidelines: Registry<Guideline>,
    pub(crate) checks: Registry<Check>,
    pub(crate) check_tools: Registry<CheckTool>,
    pub(crate) faqs: Registry<Faq>,
    pub(crate) faq_tags: Registry<FaqTag>,
    pub(crate) axe_rules: Registry<AxeRule>,
    pub(crate) relationships: RelationshipManager,
    pub(crate) axe_metadata: Option<AxeMetadata>,
    pub(crate) procedure_ids: HashSet<String>,
}

impl Corpus {
    /// Empty corpus; nothing is registered, not even check tools
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            categories: Registry::new(),
            wcag_scs: Registry::new(),
            info_refs: Registry::new(),
            guidelines: Registry::new(),
            checks: Registry::new(),
            check_tools: Registry::new(),
            faqs: Registry::new(),
            faq_tags: Registry::new(),
            axe_rules: Registry::new(),
            relationships: RelationshipManager::new(),
            axe_metadata: None,
            procedure_ids: HashSet::new(),
        }
    }

    /// Register one [`CheckTool`] per entry of the catalog's check-tool table
    pub fn seed_check_tools(&mut self) -> Result<()> {
        let tools: Vec<(String, Localized)> = self
            .settings
            .messages
            .check_tools
            .iter()
            .map(|(id, names)| (id.clone(), names.iter().collect()))
            .collect();
        for (id, names) in tools {
            self.add_check_tool(&id, names)?;
        }
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.settings.messages
    }

    pub fn relationships(&self) -> &RelationshipManager {
        &self.relationships
    }

    pub fn categories(&self) -> &Registry<Category> {
        &self.categories
    }

    pub fn wcag_scs(&self) -> &Registry<WcagSc> {
        &self.wcag_scs
    }

    pub fn info_refs(&self) -> &Registry<InfoRef> {
        &self.info_refs
    }

    pub fn guidelines(&self) -> &Registry<Guideline> {
        &self.guidelines
    }

    pub fn checks(&self) -> &Registry<Check> {
        &self.checks
    }

    pub fn check_tools(&self) -> &Registry<CheckTool> {
        &self.check_tools
    }

    pub fn faqs(&self) -> &Registry<Faq> {
        &self.faqs
    }

    pub fn faq_tags(&self) -> &Registry<FaqTag> {
        &self.faq_tags
    }

    pub fn axe_rules(&self) -> &Registry<AxeRule> {
        &self.axe_rules
    }

    /// Version information of the axe-core tree the rules were read from
    pub fn axe_metadata(&self) -> Option<&AxeMetadata> {
        self.axe_metadata.as_ref()
    }

    pub fn get<T: Stored>(&self, id: &str) -> Option<&T> {
        T::registry(self).get(id)
    }

    /// All entities of a type, ordered by sort key
    pub fn all<T: Stored>(&self) -> Vec<&T> {
        T::registry(self).all()
    }

    /// Template data of one guideline, check, FAQ or axe rule in `lang`
    pub fn page_data(&self, key: &EntityKey, lang: &str) -> Result<serde_json::Value> {
        self.settings.check_language(lang)?;
        let missing = || GuidelineError::Data(format!("no {} with ID {}", key.kind, key.id));
        let value = match key.kind {
            EntityKind::Guideline => {
                let guideline = self.get::<Guideline>(&key.id).ok_or_else(missing)?;
                serde_json::to_value(guideline.template_data(self, lang))
            }
            EntityKind::Check => {
                let check = self.get::<Check>(&key.id).ok_or_else(missing)?;
                serde_json::to_value(check.template_data(self, lang, None))
            }
            EntityKind::Faq => {
                let faq = self.get::<Faq>(&key.id).ok_or_else(missing)?;
                serde_json::to_value(faq.template_data(self, lang))
            }
            EntityKind::AxeRule => {
                let rule = self.get::<AxeRule>(&key.id).ok_or_else(missing)?;
                serde_json::to_value(rule.template_data(self, lang))
            }
            other => return Err(GuidelineError::Data(format!("{other} entities have no page data"))),
        };
        value.map_err(|e| GuidelineError::Data(e.to_string()))
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Category => self.categories.len(),
            EntityKind::WcagSc => self.wcag_scs.len(),
            EntityKind::InfoRef => self.info_refs.len(),
            EntityKind::Guideline => self.guidelines.len(),
            EntityKind::Check => self.checks.len(),
            EntityKind::CheckTool => self.check_tools.len(),
            EntityKind::Faq => self.faqs.len(),
            EntityKind::FaqTag => self.faq_tags.len(),
            EntityKind::AxeRule => self.axe_rules.len(),
        }
    }

    /// Entities of type `T` related to `from`, in association order
    pub fn related<T: Stored>(&self, from: &EntityKey) -> Vec<&T> {
        self.relationships
            .related(from, T::KIND)
            .into_iter()
            .filter_map(|key| T::registry(self).get(&key.id))
            .collect()
    }

    /// Related entities ordered by sort key; ties keep association order
    pub fn related_sorted<T: Stored>(&self, from: &EntityKey) -> Vec<&T> {
        let mut related = self.related::<T>(from);
        related.sort_by_key(|entity| entity.sort_key());
        related
    }

    /// Related entities ordered by an arbitrary key
    pub fn related_sorted_by<T, K, F>(&self, from: &EntityKey, key: F) -> Vec<&T>
    where
        T: Stored,
        K: Ord,
        F: Fn(&T) -> K,
    {
        let mut related = self.related::<T>(from);
        related.sort_by_key(|entity| key(entity));
        related
    }

    /// Fill languages missing from `text` with the default language's text
    pub(crate) fn localize(&self, mut text: Localized) -> Localized {
        text.complete(self.settings.languages(), self.settings.default_language());
        text
    }

    pub(crate) fn associate(&mut self, a: &EntityKey, b: &EntityKey) {
        self.relationships.associate(a, b);
    }

    /// Associate every pending FAQ pair whose articles both exist
    pub fn resolve_faqs(&mut self) -> usize {
        let faqs = &self.faqs;
        self.relationships.resolve_faqs(|id| faqs.contains(id))
    }
}

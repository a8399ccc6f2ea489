//! Entity Registry
//!
//! Per-type identity maps. Each entity type owns one [`Registry`]; inserting
//! enforces id and sort-key uniqueness, enumeration is ordered by sort key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{GuidelineError, Result};

/// Closed set of entity types; the string tags are part of the export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    WcagSc,
    InfoRef,
    Guideline,
    Check,
    CheckTool,
    Faq,
    FaqTag,
    AxeRule,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Category,
        EntityKind::WcagSc,
        EntityKind::InfoRef,
        EntityKind::Guideline,
        EntityKind::Check,
        EntityKind::CheckTool,
        EntityKind::Faq,
        EntityKind::FaqTag,
        EntityKind::AxeRule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::WcagSc => "wcag_sc",
            EntityKind::InfoRef => "info_ref",
            EntityKind::Guideline => "guideline",
            EntityKind::Check => "check",
            EntityKind::CheckTool => "check_tool",
            EntityKind::Faq => "faq",
            EntityKind::FaqTag => "faq_tag",
            EntityKind::AxeRule => "axe_rule",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = GuidelineError;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GuidelineError::Data(format!("unknown entity type: {s}")))
    }
}

/// `(type, id)` address of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Ordering token, unique per entity type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Int(n) => write!(f, "{n}"),
            SortKey::Text(s) => f.write_str(s),
        }
    }
}

/// Contract shared by every entity type
pub trait Entity {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Defaults to the id for types without an explicit sort key
    fn sort_key(&self) -> SortKey {
        SortKey::Text(self.id().to_string())
    }

    /// Source file the entity was read from, for dependency tracking
    fn src_path(&self) -> Option<&Path> {
        None
    }

    fn key(&self) -> EntityKey {
        EntityKey::new(Self::KIND, self.id())
    }
}

/// Identity map for one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T> {
    items: HashMap<String, T>,
    insertion: Vec<String>,
    sort_keys: HashMap<SortKey, String>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            insertion: Vec::new(),
            sort_keys: HashMap::new(),
        }
    }
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, rejecting duplicate ids and sort keys
    pub fn insert(&mut self, item: T) -> Result<&T> {
        let id = item.id().to_string();
        if self.items.contains_key(&id) {
            return Err(GuidelineError::DuplicateId { kind: T::KIND, id });
        }
        let sort_key = item.sort_key();
        if self.sort_keys.contains_key(&sort_key) {
            return Err(GuidelineError::DuplicateSortKey {
                kind: T::KIND,
                key: sort_key.to_string(),
            });
        }
        self.sort_keys.insert(sort_key, id.clone());
        self.insertion.push(id.clone());
        Ok(self.items.entry(id).or_insert(item))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.insertion.iter().filter_map(|id| self.items.get(id))
    }

    /// Entities ordered by sort key, ties broken by id
    pub fn all(&self) -> Vec<&T> {
        let mut all: Vec<&T> = self.items.values().collect();
        all.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then_with(|| a.id().cmp(b.id())));
        all
    }

    /// Entities ordered by id
    pub fn all_by_id(&self) -> Vec<&T> {
        let mut all: Vec<&T> = self.items.values().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }
}

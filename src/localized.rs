//! Language-keyed text values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `{lang -> text}` map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized(BTreeMap<String, String>);

impl Localized {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// Text for `lang`, then `default_lang`, then empty
    pub fn resolve(&self, lang: &str, default_lang: &str) -> &str {
        self.get(lang).or_else(|| self.get(default_lang)).unwrap_or_default()
    }

    /// Text for `lang`, empty when absent.
    ///
    /// Entity maps are completed for every configured language when the
    /// entity is registered, so this only misses for unconfigured languages.
    pub fn text(&self, lang: &str) -> &str {
        self.get(lang).unwrap_or_default()
    }

    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }

    /// Fill every configured language missing from the map with the default language's text
    pub fn complete(&mut self, languages: &[String], default_lang: &str) {
        let Some(fallback) = self.0.get(default_lang).cloned() else {
            return;
        };
        for lang in languages {
            self.0.entry(lang.clone()).or_insert_with(|| fallback.clone());
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut String)> {
        self.0.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply `f` to every translation
    pub fn map(&self, mut f: impl FnMut(&str, &str) -> String) -> Localized {
        Localized(self.0.iter().map(|(lang, text)| (lang.clone(), f(lang, text))).collect())
    }
}

impl<L: Into<String>, T: Into<String>> FromIterator<(L, T)> for Localized {
    fn from_iter<I: IntoIterator<Item = (L, T)>>(iter: I) -> Self {
        Localized(iter.into_iter().map(|(l, t)| (l.into(), t.into())).collect())
    }
}

use serde::Serialize;
use std::cmp::Reverse;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::localized::Localized;
use crate::models::Faq;
use crate::registry::{Entity, EntityKind};

/// Label grouping FAQ articles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqTag {
    pub id: String,
    pub names: Localized,
}

impl Entity for FaqTag {
    const KIND: EntityKind = EntityKind::FaqTag;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Ordering of [`Corpus::faq_tags_sorted`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqTagSort {
    /// Most articles first
    Count,
    /// English label
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqTagTemplate {
    pub tag: String,
    pub label: String,
    pub articles: Vec<String>,
    pub count: usize,
}

impl FaqTag {
    /// Localized label, falling back to English
    pub fn get_name(&self, lang: &str) -> &str {
        self.names.resolve(lang, "en")
    }

    pub fn article_count(&self, corpus: &Corpus) -> usize {
        corpus.related::<Faq>(&self.key()).len()
    }

    /// Tag page data; `None` for tags without articles
    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> Option<FaqTagTemplate> {
        let faqs = corpus.related_sorted::<Faq>(&self.key());
        if faqs.is_empty() {
            return None;
        }
        Some(FaqTagTemplate {
            tag: self.id.clone(),
            label: self.get_name(lang).to_string(),
            count: faqs.len(),
            articles: faqs.into_iter().map(|faq| faq.id.clone()).collect(),
        })
    }
}

impl Corpus {
    pub fn add_faq_tag(&mut self, id: &str, names: Localized) -> Result<&FaqTag> {
        let names = self.localize(names);
        self.faq_tags.insert(FaqTag {
            id: id.to_string(),
            names,
        })
    }

    /// All tags in load order, or ordered by `sort`
    pub fn faq_tags_sorted(&self, sort: Option<FaqTagSort>) -> Vec<&FaqTag> {
        let mut tags: Vec<&FaqTag> = self.faq_tags.iter().collect();
        match sort {
            Some(FaqTagSort::Count) => tags.sort_by_key(|tag| Reverse(tag.article_count(self))),
            Some(FaqTagSort::Label) => tags.sort_by(|a, b| a.get_name("en").cmp(b.get_name("en"))),
            None => {}
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_tag_without_articles() {
        let mut corpus = Corpus::new(Settings::default());
        corpus
            .add_faq_tag("form", [("ja", "フォーム"), ("en", "Forms")].into_iter().collect())
            .unwrap();
        let tag = corpus.get::<FaqTag>("form").unwrap();
        assert_eq!(tag.article_count(&corpus), 0);
        assert!(tag.template_data(&corpus, "ja").is_none());
    }

    #[test]
    fn test_name_falls_back_to_english() {
        let mut corpus = Corpus::new(Settings::default());
        corpus
            .add_faq_tag("image", [("en", "Images")].into_iter().collect())
            .unwrap();
        let tag = corpus.get::<FaqTag>("image").unwrap();
        assert_eq!(tag.get_name("ja"), "Images");
    }

    #[test]
    fn test_sort_by_label() {
        let mut corpus = Corpus::new(Settings::default());
        for (id, ja, en) in [("zoom", "拡大", "Zoom"), ("audio", "音声", "Audio"), ("form", "フォーム", "Forms")] {
            corpus
                .add_faq_tag(id, [("ja", ja), ("en", en)].into_iter().collect())
                .unwrap();
        }
        let ids: Vec<_> = corpus
            .faq_tags_sorted(Some(FaqTagSort::Label))
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["audio", "form", "zoom"]);
        let ids: Vec<_> = corpus.faq_tags_sorted(None).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["zoom", "audio", "form"]);
    }
}

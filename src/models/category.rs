use std::path::PathBuf;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::localized::Localized;
use crate::models::{Check, Faq, Guideline};
use crate::registry::{Entity, EntityKind};

/// Namespace grouping guidelines; its id appears in guideline URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub names: Localized,
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Category {
    pub fn get_name(&self, lang: &str) -> &str {
        self.names.text(lang)
    }

    /// Source files whose content is rendered on the category page
    pub fn dependencies(&self, corpus: &Corpus) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        let mut push = |path: Option<&std::path::Path>| {
            if let Some(path) = path {
                if !paths.iter().any(|p| p == path) {
                    paths.push(path.to_path_buf());
                }
            }
        };
        for guideline in corpus.related_sorted::<Guideline>(&self.key()) {
            push(guideline.src_path());
            for check in corpus.related::<Check>(&guideline.key()) {
                push(check.src_path());
            }
            for faq in corpus.related::<Faq>(&guideline.key()) {
                push(faq.src_path());
            }
        }
        paths
    }
}

impl Corpus {
    pub fn add_category(&mut self, id: &str, names: Localized) -> Result<&Category> {
        let names = self.localize(names);
        self.categories.insert(Category {
            id: id.to_string(),
            names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_category_name_fills_missing_language() {
        let mut corpus = Corpus::new(Settings::default());
        let names: Localized = [("ja", "画像")].into_iter().collect();
        corpus.add_category("image", names).unwrap();

        let category = corpus.get::<Category>("image").unwrap();
        assert_eq!(category.get_name("ja"), "画像");
        assert_eq!(category.get_name("en"), "画像");
        assert!(category.dependencies(&corpus).is_empty());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut corpus = Corpus::new(Settings::default());
        corpus.add_category("form", Localized::new()).unwrap();
        let err = corpus.add_category("form", Localized::new()).unwrap_err();
        assert!(err.to_string().contains("category"));
    }
}

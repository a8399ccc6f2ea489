//! Links for internal supplemental-reading references
//!
//! Internal references name a label of the documentation build. The page,
//! anchor and title of each label are only known after that build, so they
//! come from a [`LabelSource`] and are attached to the corpus afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::corpus::Corpus;
use crate::error::{GuidelineError, Result};
use crate::localized::Localized;
use crate::models::LinkData;
use crate::recovery::retry;

/// Where a documentation label points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLabel {
    /// Document path without extension, e.g. `explanations/contrast`
    pub page: String,
    pub anchor: String,
    /// Section title shown as link text
    pub text: String,
}

impl DocLabel {
    fn is_complete(&self) -> bool {
        !self.page.is_empty() && !self.anchor.is_empty() && !self.text.is_empty()
    }
}

/// Provider of the label table of one language's documentation build
pub trait LabelSource {
    fn labels(&self, lang: &str) -> Result<BTreeMap<String, DocLabel>>;
}

/// Labels held in memory, keyed by language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticLabels(HashMap<String, BTreeMap<String, DocLabel>>);

impl StaticLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lang: &str, label: &str, target: DocLabel) {
        self.0
            .entry(lang.to_string())
            .or_default()
            .insert(label.to_string(), target);
    }

    /// Read `{lang: {label: {page, anchor, text}}}` from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| GuidelineError::FileOperation {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| GuidelineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl LabelSource for StaticLabels {
    fn labels(&self, lang: &str) -> Result<BTreeMap<String, DocLabel>> {
        Ok(self.0.get(lang).cloned().unwrap_or_default())
    }
}

/// Build `label -> link` for every configured language
pub fn collect_links(corpus: &Corpus, source: &dyn LabelSource) -> Result<BTreeMap<String, LinkData>> {
    let settings = corpus.settings();
    let mut links: BTreeMap<String, LinkData> = BTreeMap::new();
    for lang in settings.languages() {
        let labels = retry(|| source.labels(lang), 2, Duration::from_millis(100))?;
        let prefix = if settings.is_default_language(lang) {
            String::new()
        } else {
            format!("{lang}/")
        };
        for (label, target) in labels {
            if !target.is_complete() {
                debug!(label = %label, lang = %lang, "skipping incomplete label");
                continue;
            }
            let link = links.entry(label).or_insert_with(|| LinkData {
                text: Localized::new(),
                url: Localized::new(),
            });
            link.text.insert(lang.as_str(), target.text);
            link.url.insert(
                lang.as_str(),
                format!("{}/{prefix}{}.html#{}", settings.base_url, target.page, target.anchor),
            );
        }
    }
    Ok(links)
}

/// Attach links to internal references; returns how many were resolved
pub fn resolve_info_links(corpus: &mut Corpus, source: &dyn LabelSource) -> Result<usize> {
    let links = collect_links(corpus, source)?;
    let targets: Vec<(String, LinkData)> = corpus
        .info_refs()
        .iter()
        .filter(|info| info.internal)
        .filter_map(|info| {
            links.get(&info.reference).map(|link| {
                (
                    info.id.clone(),
                    LinkData {
                        text: corpus.localize(link.text.clone()),
                        url: corpus.localize(link.url.clone()),
                    },
                )
            })
        })
        .collect();

    let mut resolved = 0;
    for (id, link) in targets {
        if corpus.set_info_link(&id, link) {
            resolved += 1;
        }
    }
    for info in corpus.unresolved_info_refs() {
        warn!(reference = %info.reference, "no documentation label for internal reference");
    }
    info!(resolved, labels = links.len(), "resolved internal reference links");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::InfoRef;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn label(page: &str, anchor: &str, text: &str) -> DocLabel {
        DocLabel {
            page: page.to_string(),
            anchor: anchor.to_string(),
            text: text.to_string(),
        }
    }

    fn labels() -> StaticLabels {
        let mut labels = StaticLabels::new();
        labels.insert("ja", "exp-contrast", label("explanations/contrast", "exp-contrast", "コントラスト"));
        labels.insert("en", "exp-contrast", label("explanations/contrast", "exp-contrast", "Contrast"));
        labels.insert("ja", "exp-broken", label("", "exp-broken", "壊れたラベル"));
        labels
    }

    #[test]
    fn test_collect_links() {
        let corpus = Corpus::new(Settings::default());
        let links = collect_links(&corpus, &labels()).unwrap();
        assert_eq!(links.len(), 1);
        let link = &links["exp-contrast"];
        assert_eq!(
            link.url.get("ja"),
            Some("https://a11y-guidelines.freee.co.jp/explanations/contrast.html#exp-contrast")
        );
        assert_eq!(
            link.url.get("en"),
            Some("https://a11y-guidelines.freee.co.jp/en/explanations/contrast.html#exp-contrast")
        );
        assert_eq!(link.text.get("en"), Some("Contrast"));
    }

    #[test]
    fn test_resolve_internal_refs_only() {
        let mut corpus = Corpus::new(Settings::default());
        let contrast = corpus.add_info_ref("exp-contrast").unwrap();
        corpus.add_info_ref("exp-missing").unwrap();
        corpus.add_info_ref("https://example.com/doc").unwrap();

        assert_eq!(resolve_info_links(&mut corpus, &labels()).unwrap(), 1);
        let info = corpus.get::<InfoRef>(&contrast.id).unwrap();
        assert_eq!(info.link_data().unwrap().text.get("ja"), Some("コントラスト"));
        let unresolved: Vec<_> = corpus
            .unresolved_info_refs()
            .iter()
            .map(|info| info.reference.as_str())
            .collect();
        assert_eq!(unresolved, ["exp-missing"]);
    }

    #[test]
    fn test_labels_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(
            &path,
            r#"{"ja": {"exp-contrast": {"page": "explanations/contrast", "anchor": "exp-contrast", "text": "コントラスト"}}}"#,
        )
        .unwrap();
        let labels = StaticLabels::from_json_file(&path).unwrap();
        assert_eq!(labels.labels("ja").unwrap().len(), 1);
        assert!(labels.labels("en").unwrap().is_empty());
    }
}

//! axe-core source tree reader
//!
//! Rules are read from the commit the superproject records for the axe-core
//! submodule, so that generated pages match the pinned release even when the
//! submodule checkout has moved. Without git metadata the working tree is
//! read instead.

use chrono::{DateTime, FixedOffset};
use git2::{ObjectType, Oid, Repository, Tree, TreeWalkMode, TreeWalkResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::AxeCoreSettings;
use crate::error::{GuidelineError, Result};
use crate::models::{AxeLocale, AxeRuleData};
use crate::recovery::with_fallback;

/// Parsed contents of an axe-core tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxeTree {
    pub rules: Vec<AxeRuleData>,
    pub locale_ja: AxeLocale,
    pub version: String,
    /// `%F %T%z` author time of the commit, when read from git
    pub timestamp: Option<String>,
}

#[derive(Deserialize)]
struct PackageFile {
    version: String,
}

#[derive(Debug, Clone)]
pub struct AxeSource {
    repo_dir: PathBuf,
    settings: AxeCoreSettings,
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8], path: &Path) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| GuidelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(GuidelineError::ResourceNotFound {
            what: "axe-core file",
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| GuidelineError::FileOperation {
        operation: "read",
        path: path.to_path_buf(),
        source,
    })
}

fn format_commit_time(seconds: i64, offset_minutes: i32) -> Option<String> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    let time = DateTime::from_timestamp(seconds, 0)?.with_timezone(&offset);
    Some(time.format("%F %T%z").to_string())
}

impl AxeSource {
    /// Source for the axe-core tree of the repository at `repo_dir`
    pub fn new(repo_dir: impl Into<PathBuf>, settings: &AxeCoreSettings) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            settings: settings.clone(),
        }
    }

    pub fn axe_dir(&self) -> PathBuf {
        self.repo_dir.join(&self.settings.base_dir)
    }

    fn locale_path(&self) -> PathBuf {
        Path::new(&self.settings.locale_dir).join(&self.settings.locale_ja_file)
    }

    /// Read the pinned commit, falling back to the working tree
    pub fn read(&self) -> Result<AxeTree> {
        let tree = with_fallback(|| self.read_commit(), || self.read_worktree(), "axe-core rules")?;
        info!(rules = tree.rules.len(), version = %tree.version, "loaded axe-core rules");
        Ok(tree)
    }

    /// Commit recorded for the submodule in the superproject
    fn pinned_commit(&self) -> Result<Oid> {
        let superproject = Repository::open(&self.repo_dir)?;
        let submodule = superproject.find_submodule(&self.settings.submodule_name)?;
        submodule.head_id().or_else(|| submodule.index_id()).ok_or_else(|| {
            GuidelineError::Data(format!(
                "submodule {} has no recorded commit",
                self.settings.submodule_name
            ))
        })
    }

    fn read_blob<T: DeserializeOwned>(&self, repo: &Repository, tree: &Tree<'_>, path: &Path) -> Result<T> {
        let blob = tree.get_path(path)?.to_object(repo)?.peel_to_blob()?;
        parse_json(blob.content(), &self.axe_dir().join(path))
    }

    pub fn read_commit(&self) -> Result<AxeTree> {
        let oid = self.pinned_commit()?;
        let repo = Repository::open(self.axe_dir())?;
        let commit = repo.find_commit(oid)?;
        let tree = commit.tree()?;
        debug!(commit = %oid, "reading axe-core commit");

        let locale_ja: AxeLocale = self.read_blob(&repo, &tree, &self.locale_path())?;
        let package: PackageFile = self.read_blob(&repo, &tree, Path::new(&self.settings.pkg_file))?;

        let rules_dir = Path::new(&self.settings.rules_dir);
        let rules_tree = tree.get_path(rules_dir)?.to_object(&repo)?.peel_to_tree()?;
        let mut blobs: Vec<(String, Oid)> = Vec::new();
        rules_tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name().filter(|name| name.ends_with(".json")) {
                    blobs.push((format!("{root}{name}"), entry.id()));
                }
            }
            TreeWalkResult::Ok
        })?;

        let mut rules = Vec::with_capacity(blobs.len());
        for (name, id) in blobs {
            let blob = repo.find_blob(id)?;
            rules.push(parse_json(blob.content(), &self.axe_dir().join(rules_dir).join(name))?);
        }

        let author = commit.author();
        Ok(AxeTree {
            rules,
            locale_ja,
            version: package.version,
            timestamp: format_commit_time(author.when().seconds(), author.when().offset_minutes()),
        })
    }

    pub fn read_worktree(&self) -> Result<AxeTree> {
        let base = self.axe_dir();
        let locale_path = base.join(self.locale_path());
        let locale_ja: AxeLocale = parse_json(&read_file(&locale_path)?, &locale_path)?;
        let pkg_path = base.join(&self.settings.pkg_file);
        let package: PackageFile = parse_json(&read_file(&pkg_path)?, &pkg_path)?;

        let rules_dir = base.join(&self.settings.rules_dir);
        if !rules_dir.is_dir() {
            return Err(GuidelineError::ResourceNotFound {
                what: "axe-core rules directory",
                path: rules_dir,
            });
        }
        let mut rules = Vec::new();
        for entry in WalkDir::new(&rules_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| GuidelineError::Data(format!("walking {}: {e}", rules_dir.display())))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
                rules.push(parse_json(&read_file(path)?, path)?);
            }
        }

        Ok(AxeTree {
            rules,
            locale_ja,
            version: package.version,
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_read_worktree_without_git() {
        let dir = TempDir::new().unwrap();
        let axe = dir.path().join("vendor/axe-core");
        write(&axe.join("package.json"), r#"{"name": "axe-core", "version": "4.8.2"}"#);
        write(
            &axe.join("locales/ja.json"),
            r#"{"lang": "ja", "rules": {"image-alt": {"help": "画像には代替テキストが必要です"}}}"#,
        );
        write(
            &axe.join("lib/rules/image-alt.json"),
            r#"{"id": "image-alt", "tags": ["wcag2a", "wcag111"], "metadata": {"help": "Images must have alternative text", "description": "Ensures img elements have alternate text"}}"#,
        );
        write(
            &axe.join("lib/rules/nested/region.json"),
            r#"{"id": "region", "tags": ["best-practice"], "metadata": {"help": "Content in landmarks", "description": "Ensures content is in landmarks"}}"#,
        );
        write(&axe.join("lib/rules/region-evaluate.js"), "export default function () {}");

        let settings = Settings::default();
        let source = AxeSource::new(dir.path(), &settings.axe_core);
        let tree = source.read().unwrap();
        assert_eq!(tree.version, "4.8.2");
        assert_eq!(tree.timestamp, None);
        let ids: Vec<_> = tree.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["image-alt", "region"]);
        assert!(tree.locale_ja.rules["image-alt"].description.is_none());
    }

    #[test]
    fn test_missing_tree_is_error() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default();
        let err = AxeSource::new(dir.path(), &settings.axe_core).read().unwrap_err();
        assert!(matches!(err, GuidelineError::Fallback { .. }));
    }

    #[test]
    fn test_commit_time_format() {
        assert_eq!(
            format_commit_time(1_700_000_000, 540).as_deref(),
            Some("2023-11-15 07:13:20+0900")
        );
    }
}

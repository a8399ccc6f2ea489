//! Source tree layout and corpus loading
//!
//! Loading order matters: every relationship is established when its
//! source entity is constructed, so targets must already exist.
//!
//! 1. check tools from the message catalog
//! 2. static JSON tables: categories, success criteria, FAQ tags, external references
//! 3. checks, guidelines, FAQs (each file schema-validated first)
//! 4. axe-core rules
//! 5. FAQ-to-FAQ links recorded while loading FAQs

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::axe_source::AxeSource;
use crate::config::Settings;
use crate::corpus::Corpus;
use crate::error::{GuidelineError, Result};
use crate::localized::Localized;
use crate::models::{AxeMetadata, CheckData, FaqData, GuidelineData, LinkData, WcagScRecord};
use crate::recovery::graceful_degradation;
use crate::registry::EntityKind;
use crate::validator::YamlValidator;

/// Fixed locations of the source files under a base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    base: PathBuf,
}

impl SourceLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn checks_dir(&self) -> PathBuf {
        self.base.join("data/yaml/checks")
    }

    pub fn guidelines_dir(&self) -> PathBuf {
        self.base.join("data/yaml/gl")
    }

    pub fn faq_dir(&self) -> PathBuf {
        self.base.join("data/yaml/faq")
    }

    pub fn categories_file(&self) -> PathBuf {
        self.base.join("data/json/guideline-categories.json")
    }

    pub fn wcag_sc_file(&self) -> PathBuf {
        self.base.join("data/json/wcag-sc.json")
    }

    pub fn faq_tags_file(&self) -> PathBuf {
        self.base.join("data/json/faq-tags.json")
    }

    pub fn info_file(&self) -> PathBuf {
        self.base.join("data/json/info.json")
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.base.join("data/json/schemas")
    }

    pub fn version_file(&self) -> PathBuf {
        self.base.join("version.py")
    }
}

/// YAML files below `dir`, sorted by path
pub fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GuidelineError::ResourceNotFound {
            what: "Source directory",
            path: dir.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| GuidelineError::Data(format!("walking {}: {e}", dir.display())))?;
        let is_yaml = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if entry.file_type().is_file() && is_yaml {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_to_string(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(GuidelineError::ResourceNotFound {
            what: "Source file",
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| GuidelineError::FileOperation {
        operation: "read",
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a YAML document into a JSON value for schema validation
pub fn read_yaml(path: &Path) -> Result<Value> {
    let contents = read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|source| GuidelineError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a `{key: entry}` table
fn read_json_table(path: &Path) -> Result<Map<String, Value>> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| GuidelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn from_value<T: DeserializeOwned>(value: Value, path: &Path) -> Result<T> {
    serde_json::from_value(value).map_err(|source| GuidelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl Corpus {
    /// Load every source file under `base_dir`.
    ///
    /// The returned corpus is complete; no further mutation is possible
    /// through the public API except attaching internal reference links.
    pub fn initialize(base_dir: impl AsRef<Path>, settings: Settings) -> Result<Corpus> {
        let layout = SourceLayout::new(base_dir.as_ref());
        let validator = YamlValidator::new(layout.schema_dir(), settings.validation_mode())?;

        let mut corpus = Corpus::new(settings);
        corpus.seed_check_tools()?;
        corpus.load_static_tables(&layout)?;
        corpus.load_documents(&layout, &validator)?;
        corpus.load_axe_rules(&layout)?;
        let linked = corpus.resolve_faqs();

        info!(
            guidelines = corpus.count(EntityKind::Guideline),
            checks = corpus.count(EntityKind::Check),
            faqs = corpus.count(EntityKind::Faq),
            axe_rules = corpus.count(EntityKind::AxeRule),
            faq_links = linked,
            "corpus loaded"
        );
        Ok(corpus)
    }

    fn load_static_tables(&mut self, layout: &SourceLayout) -> Result<()> {
        let path = layout.categories_file();
        for (id, names) in read_json_table(&path)? {
            let names: Localized = from_value(names, &path)?;
            self.add_category(&id, names).map_err(|e| e.in_file(&path))?;
        }

        let path = layout.wcag_sc_file();
        for (id, record) in read_json_table(&path)? {
            let record: WcagScRecord = from_value(record, &path)?;
            self.add_wcag_sc(&id, record).map_err(|e| e.in_file(&path))?;
        }

        let path = layout.faq_tags_file();
        for (id, names) in read_json_table(&path)? {
            let names: Localized = from_value(names, &path)?;
            self.add_faq_tag(&id, names).map_err(|e| e.in_file(&path))?;
        }

        let path = layout.info_file();
        for (reference, link) in read_json_table(&path)? {
            let link: LinkData = from_value(link, &path)?;
            self.add_external_info(&reference, link).map_err(|e| e.in_file(&path))?;
        }

        debug!(
            categories = self.count(EntityKind::Category),
            wcag_scs = self.count(EntityKind::WcagSc),
            faq_tags = self.count(EntityKind::FaqTag),
            "static tables loaded"
        );
        Ok(())
    }

    fn load_documents(&mut self, layout: &SourceLayout, validator: &YamlValidator) -> Result<()> {
        for path in yaml_files(&layout.checks_dir())? {
            let data: CheckData = read_validated(&path, "check", validator)?;
            self.add_check(data, &path).map_err(|e| e.in_file(&path))?;
        }
        for path in yaml_files(&layout.guidelines_dir())? {
            let data: GuidelineData = read_validated(&path, "guideline", validator)?;
            self.add_guideline(data, &path).map_err(|e| e.in_file(&path))?;
        }
        for path in yaml_files(&layout.faq_dir())? {
            let data: FaqData = read_validated(&path, "faq", validator)?;
            self.add_faq(data, &path).map_err(|e| e.in_file(&path))?;
        }
        Ok(())
    }

    fn load_axe_rules(&mut self, layout: &SourceLayout) -> Result<()> {
        let source = AxeSource::new(layout.base(), &self.settings().axe_core);
        let axe_dir = source.axe_dir();
        // Only an absent tree is optional; a present but unreadable one is fatal.
        let tree = match source.read() {
            Err(e) if !axe_dir.is_dir() => graceful_degradation(|| Err(e), || None, "axe-core rules"),
            loaded => Some(loaded.map_err(|e| e.in_file(&axe_dir))?),
        };
        let Some(tree) = tree else {
            return Ok(());
        };
        for rule in tree.rules {
            self.add_axe_rule(rule, &tree.locale_ja)
                .map_err(|e| e.in_file(&axe_dir))?;
        }
        let metadata = AxeMetadata::new(&tree.version, &self.settings().axe_core.deque_url, tree.timestamp);
        self.set_axe_metadata(metadata);
        Ok(())
    }
}

fn read_validated<T: DeserializeOwned>(path: &Path, schema: &str, validator: &YamlValidator) -> Result<T> {
    debug!(path = %path.display(), schema, "loading");
    let value = read_yaml(path)?;
    validator.validate(&value, schema, path)?;
    from_value(value, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = SourceLayout::new("/srv/guidelines");
        assert_eq!(layout.checks_dir(), PathBuf::from("/srv/guidelines/data/yaml/checks"));
        assert_eq!(
            layout.schema_dir(),
            PathBuf::from("/srv/guidelines/data/json/schemas")
        );
        assert_eq!(layout.version_file(), PathBuf::from("/srv/guidelines/version.py"));
    }

    #[test]
    fn test_yaml_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("code")).unwrap();
        fs::create_dir_all(dir.path().join("design")).unwrap();
        fs::write(dir.path().join("design/0002.yaml"), "id: '0002'").unwrap();
        fs::write(dir.path().join("code/0001.yaml"), "id: '0001'").unwrap();
        fs::write(dir.path().join("code/README.md"), "notes").unwrap();

        let files = yaml_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["code/0001.yaml", "design/0002.yaml"]);
    }

    #[test]
    fn test_missing_source_directory() {
        let dir = TempDir::new().unwrap();
        let err = yaml_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, GuidelineError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_yaml_parse_error_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "id: [unclosed").unwrap();
        let err = read_yaml(&path).unwrap_err();
        assert!(matches!(err, GuidelineError::Yaml { .. }));
    }
}

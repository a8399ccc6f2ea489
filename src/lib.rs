//! Accessibility Guidelines Content Model
//!
//! Loads the YAML/JSON source corpus of the accessibility guidelines
//! publication into a graph of typed entities and exposes ordered,
//! language-localized projections for the renderers (Sphinx pages, the JSON
//! export and the check sheet).
//!
//! ## Source layout
//!
//! ```text
//! data/
//! ├── yaml/
//! │   ├── checks/<target>/<id>.yaml
//! │   ├── gl/<category>/<name>.yaml
//! │   └── faq/<id>.yaml
//! └── json/
//!     ├── guideline-categories.json
//!     ├── wcag-sc.json
//!     ├── faq-tags.json
//!     ├── info.json
//!     └── schemas/{common,check,guideline,faq}.json
//! version.py
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use a11y_guidelines::{Check, Guideline};
//!
//! let corpus = a11y_guidelines::initialize("path/to/a11y-guidelines", None)?;
//! for guideline in corpus.all::<Guideline>() {
//!     let page = guideline.template_data(&corpus, "ja");
//!     println!("{} ({} checks)", page.title, page.checks.len());
//! }
//! let export = Check::object_data_all(&corpus);
//! # Ok::<(), a11y_guidelines::GuidelineError>(())
//! ```

pub mod axe_source;
pub mod config;
pub mod corpus;
pub mod error;
pub mod formula;
pub mod info_links;
pub mod loader;
pub mod localized;
pub mod messages;
pub mod models;
mod recovery;
pub mod registry;
pub mod relationship;
pub mod rst;
pub mod validator;
pub mod version;

use std::path::Path;

pub use config::Settings;
pub use corpus::{Corpus, Stored};
pub use error::{Diagnostic, GuidelineError, Result};
pub use formula::{ConditionTranslator, TargetProfile};
pub use localized::Localized;
pub use messages::MessageCatalog;
pub use models::{
    AxeRule, Category, Check, CheckTool, Condition, Faq, FaqTag, Guideline, InfoRef, LinkData, WcagSc,
};
pub use registry::{Entity, EntityKey, EntityKind, Registry, SortKey};
pub use relationship::RelationshipManager;
pub use validator::{ValidationMode, YamlValidator};
pub use version::VersionInfo;

/// Install settings (see [`config::initialize`]) and load the corpus under `base_dir`
pub fn initialize(base_dir: impl AsRef<Path>, overrides: Option<&serde_json::Value>) -> Result<Corpus> {
    let settings = config::initialize(None, overrides)?;
    Corpus::initialize(base_dir, Settings::clone(&settings))
}

//! Checks: testable criteria with optional condition trees

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::corpus::Corpus;
use crate::error::{GuidelineError, Result};
use crate::localized::Localized;
use crate::models::condition::ConditionRecord;
use crate::models::{
    CategoryAndId, CheckTool, Condition, ConditionData, ConditionNode, ConditionTemplate, Example, Faq, Guideline,
    InfoRef, LinkData, Procedure,
};
use crate::registry::{Entity, EntityKey, EntityKind, SortKey};
use crate::rst::RstProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Normal,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Normal => "normal",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckTarget {
    Design,
    Code,
    Product,
}

impl CheckTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckTarget::Design => "design",
            CheckTarget::Code => "code",
            CheckTarget::Product => "product",
        }
    }
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub platform: String,
    pub method: Localized,
}

/// Implementation advice for a check, with per-platform methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub title: Localized,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTemplate {
    pub platform: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplementationTemplate {
    pub title: String,
    pub methods: Vec<MethodTemplate>,
}

/// A check document as read from `data/yaml/checks/<target>/<id>.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckData {
    pub id: String,
    #[serde(rename = "sortKey")]
    pub sort_key: SortKey,
    pub check: Localized,
    pub severity: Severity,
    pub target: CheckTarget,
    pub platform: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
    #[serde(default)]
    pub implementations: Vec<Implementation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub id: String,
    pub sort_key: SortKey,
    pub check: Localized,
    pub severity: Severity,
    pub target: CheckTarget,
    pub platform: Vec<String>,
    /// One top-level condition per platform
    pub conditions: Vec<Condition>,
    pub implementations: Vec<Implementation>,
    pub src_path: PathBuf,
}

impl Entity for Check {
    const KIND: EntityKind = EntityKind::Check;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> SortKey {
        self.sort_key.clone()
    }

    fn src_path(&self) -> Option<&Path> {
        Some(&self.src_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckTemplate {
    pub id: String,
    pub check: String,
    pub severity: String,
    pub target: String,
    pub platform: String,
    pub guidelines: Vec<CategoryAndId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ConditionTemplate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementations: Option<Vec<ImplementationTemplate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faqs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_refs: Option<Vec<String>>,
}

/// Per-language summary of one top-level condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionStatement {
    pub platform: Option<String>,
    pub summary: Localized,
}

/// Exported form of a check, used by the JSON and check-sheet outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckObjectData {
    pub id: String,
    #[serde(rename = "sortKey")]
    pub sort_key: SortKey,
    pub check: Localized,
    pub severity: String,
    pub target: CheckTarget,
    pub platform: Vec<String>,
    pub guidelines: Vec<LinkData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faqs: Option<Vec<LinkData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Vec<LinkData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ConditionData>>,
    #[serde(rename = "conditionStatements", default, skip_serializing_if = "Option::is_none")]
    pub condition_statements: Option<Vec<ConditionStatement>>,
    /// `implementation_<platform>` -> language -> concatenated methods
    #[serde(flatten)]
    pub implementations: BTreeMap<String, Localized>,
}

impl Implementation {
    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> ImplementationTemplate {
        ImplementationTemplate {
            title: self.title.text(lang).to_string(),
            methods: self
                .methods
                .iter()
                .map(|method| MethodTemplate {
                    platform: corpus.messages().platform_name(&method.platform, lang).to_string(),
                    method: method.method.text(lang).to_string(),
                })
                .collect(),
        }
    }
}

impl Check {
    /// Every procedure of every condition, in document order
    pub fn procedures(&self) -> Vec<&Procedure> {
        self.conditions.iter().flat_map(Condition::procedures).collect()
    }

    /// Distinct platforms of the top-level conditions, sorted
    pub fn condition_platforms(&self) -> Vec<&str> {
        let mut platforms: Vec<&str> = self.conditions.iter().filter_map(|c| c.platform.as_deref()).collect();
        platforms.sort_unstable();
        platforms.dedup();
        platforms
    }

    /// Document projection; with `platform_filter`, only conditions for
    /// `general` or one of the given platforms are listed
    pub fn template_data(&self, corpus: &Corpus, lang: &str, platform_filter: Option<&[String]>) -> CheckTemplate {
        let key = self.key();
        let messages = corpus.messages();

        let conditions = (!self.conditions.is_empty()).then(|| {
            self.conditions
                .iter()
                .filter(|cond| match (platform_filter, cond.platform.as_deref()) {
                    (None, _) => true,
                    (Some(_), Some("general")) => true,
                    (Some(platforms), Some(platform)) => platforms.iter().any(|p| p == platform),
                    (Some(_), None) => false,
                })
                .filter_map(|cond| cond.template_data(corpus, lang))
                .collect()
        });

        let implementations = (!self.implementations.is_empty()).then(|| {
            self.implementations
                .iter()
                .map(|implementation| implementation.template_data(corpus, lang))
                .collect()
        });

        let faqs: Vec<String> = corpus
            .related_sorted::<Faq>(&key)
            .into_iter()
            .map(|faq| faq.id.clone())
            .collect();
        let info_refs: Vec<String> = corpus
            .related::<InfoRef>(&key)
            .into_iter()
            .map(InfoRef::refstring)
            .collect();

        CheckTemplate {
            id: self.id.clone(),
            check: self.check.text(lang).to_string(),
            severity: messages.severity_tag(self.severity.as_str(), lang).to_string(),
            target: messages.check_target(self.target.as_str(), lang).to_string(),
            platform: messages.join_platforms(&self.platform, lang),
            guidelines: corpus
                .related_sorted::<Guideline>(&key)
                .into_iter()
                .map(|gl| gl.category_and_id(corpus, lang))
                .collect(),
            conditions,
            implementations,
            faqs: (!faqs.is_empty()).then_some(faqs),
            info_refs: (!info_refs.is_empty()).then_some(info_refs),
        }
    }

    /// Exported form without markup resolution
    pub fn object_data(&self, corpus: &Corpus) -> CheckObjectData {
        let key = self.key();

        let faqs: Vec<LinkData> = corpus
            .related_sorted::<Faq>(&key)
            .into_iter()
            .map(|faq| faq.link_data(corpus))
            .collect();
        let info: Vec<LinkData> = corpus
            .related::<InfoRef>(&key)
            .into_iter()
            .filter_map(|info| info.link_data().cloned())
            .collect();

        let (conditions, condition_statements) = if self.conditions.is_empty() {
            (None, None)
        } else {
            let mut conditions = Vec::new();
            let mut statements = Vec::new();
            for condition in &self.conditions {
                let inherited = match condition.platform {
                    None => self.platform.first().map(String::as_str),
                    Some(_) => None,
                };
                let data = condition.object_data(corpus, inherited, true);
                let summary = self
                    .check
                    .languages()
                    .map(|lang| (lang, condition.summary(corpus.messages(), lang)))
                    .collect();
                statements.push(ConditionStatement {
                    platform: data.platform.clone(),
                    summary,
                });
                conditions.push(data);
            }
            (Some(conditions), Some(statements))
        };

        let mut implementations: BTreeMap<String, Localized> = BTreeMap::new();
        for implementation in &self.implementations {
            for method in &implementation.methods {
                let entry = implementations
                    .entry(format!("implementation_{}", method.platform))
                    .or_default();
                for (lang, title) in implementation.title.iter() {
                    let mut text = entry.get(lang).unwrap_or_default().to_string();
                    text.push_str(&format!("{title}:\n{}\n\n", method.method.text(lang)));
                    entry.insert(lang, text);
                }
            }
        }

        CheckObjectData {
            id: self.id.clone(),
            sort_key: self.sort_key.clone(),
            check: self.check.clone(),
            severity: format!("[{}]", self.severity.as_str().to_uppercase()),
            target: self.target,
            platform: self.platform.clone(),
            guidelines: corpus
                .related_sorted::<Guideline>(&key)
                .into_iter()
                .map(|gl| gl.link_data(corpus))
                .collect(),
            faqs: (!faqs.is_empty()).then_some(faqs),
            info: (!info.is_empty()).then_some(info),
            conditions,
            condition_statements,
            implementations,
        }
    }

    /// Exported form of every check keyed by id, with inline markup resolved
    pub fn object_data_all(corpus: &Corpus) -> BTreeMap<String, CheckObjectData> {
        let rst = RstProcessor::from_corpus(corpus);
        corpus
            .checks()
            .all_by_id()
            .into_iter()
            .map(|check| {
                let mut data = check.object_data(corpus);
                if let Some(conditions) = data.conditions.as_mut() {
                    for condition in conditions.iter_mut() {
                        rst.process_condition(condition);
                    }
                }
                (check.id.clone(), data)
            })
            .collect()
    }

    /// Document projections of every check, ordered by id
    pub fn template_data_all(corpus: &Corpus, lang: &str) -> Vec<CheckTemplate> {
        corpus
            .checks()
            .all_by_id()
            .into_iter()
            .map(|check| check.template_data(corpus, lang, None))
            .collect()
    }
}

impl Corpus {
    /// Build a condition node, mapping unknown tools to `misc`
    fn build_condition(&self, record: ConditionRecord, check_id: &str) -> Result<Condition> {
        match record {
            ConditionRecord::Simple {
                platform,
                id,
                tool,
                procedure,
                note,
                youtube,
            } => {
                let (tool, tool_display_name) = if self.check_tools.contains(&tool) {
                    (tool, None)
                } else {
                    ("misc".to_string(), Some(tool))
                };
                Ok(Condition {
                    platform,
                    node: ConditionNode::Simple(Procedure {
                        id,
                        tool,
                        tool_display_name,
                        procedure: self.localize(procedure),
                        note: note.map(|note| self.localize(note)),
                        youtube,
                    }),
                })
            }
            ConditionRecord::And { conditions, .. } | ConditionRecord::Or { conditions, .. }
                if conditions.is_empty() =>
            {
                Err(GuidelineError::Data(format!(
                    "check {check_id}: and/or conditions need at least one child"
                )))
            }
            ConditionRecord::And { platform, conditions } => Ok(Condition {
                platform,
                node: ConditionNode::And(
                    conditions
                        .into_iter()
                        .map(|c| self.build_condition(c, check_id))
                        .collect::<Result<_>>()?,
                ),
            }),
            ConditionRecord::Or { platform, conditions } => Ok(Condition {
                platform,
                node: ConditionNode::Or(
                    conditions
                        .into_iter()
                        .map(|c| self.build_condition(c, check_id))
                        .collect::<Result<_>>()?,
                ),
            }),
        }
    }

    /// Register a check read from `src_path`.
    ///
    /// The file must live at `<target>/<id>.yaml`, and procedure ids must be
    /// unique across all checks. Each procedure is recorded as an example of
    /// its tool.
    pub fn add_check(&mut self, data: CheckData, src_path: &Path) -> Result<EntityKey> {
        if self.checks.contains(&data.id) {
            return Err(GuidelineError::DuplicateId {
                kind: EntityKind::Check,
                id: data.id,
            });
        }

        let dir_matches = src_path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|dir| dir == data.target.as_str());
        let stem_matches = src_path.file_stem().is_some_and(|stem| stem == data.id.as_str());
        if !dir_matches || !stem_matches {
            return Err(GuidelineError::Data(format!(
                "check {} with target {} must be stored as {}/{}.yaml",
                data.id, data.target, data.target, data.id
            )));
        }

        let conditions = data
            .conditions
            .into_iter()
            .map(|record| self.build_condition(record, &data.id))
            .collect::<Result<Vec<_>>>()?;
        let implementations = data
            .implementations
            .into_iter()
            .map(|implementation| Implementation {
                title: self.localize(implementation.title),
                methods: implementation
                    .methods
                    .into_iter()
                    .map(|method| Method {
                        platform: method.platform,
                        method: self.localize(method.method),
                    })
                    .collect(),
            })
            .collect();

        let check = Check {
            id: data.id,
            sort_key: data.sort_key,
            check: self.localize(data.check),
            severity: data.severity,
            target: data.target,
            platform: data.platform,
            conditions,
            implementations,
            src_path: src_path.to_path_buf(),
        };

        let mut seen = HashSet::new();
        let mut uses: Vec<(String, String)> = Vec::new();
        for procedure in check.procedures() {
            if self.procedure_ids.contains(&procedure.id) || !seen.insert(procedure.id.clone()) {
                return Err(GuidelineError::Data(format!(
                    "Duplicate procedure ID: {} (check {})",
                    procedure.id, check.id
                )));
            }
            uses.push((procedure.tool.clone(), procedure.id.clone()));
        }

        let key = check.key();
        self.checks.insert(check)?;

        for (tool, procedure_id) in uses {
            self.procedure_ids.insert(procedure_id.clone());
            self.add_example(
                &tool,
                Example {
                    check_id: key.id.clone(),
                    procedure_id,
                },
            );
            self.associate(&key, &EntityKey::new(EntityKind::CheckTool, tool));
        }
        Ok(key)
    }

    /// Tools used by a check's procedures
    pub fn check_tools_of(&self, check: &Check) -> Vec<&CheckTool> {
        self.related::<CheckTool>(&check.key())
    }
}

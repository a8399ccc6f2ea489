//! Check condition trees
//!
//! A check's result is a boolean combination of procedure outcomes. Leaves
//! are procedures carried out with a tool; inner nodes combine their
//! children with AND or OR.

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::localized::Localized;
use crate::messages::MessageCatalog;
use crate::models::CheckTool;

/// Condition as written in check YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConditionRecord {
    Simple {
        #[serde(default)]
        platform: Option<String>,
        id: String,
        tool: String,
        procedure: Localized,
        #[serde(default)]
        note: Option<Localized>,
        #[serde(rename = "YouTube", default)]
        youtube: Option<YouTube>,
    },
    And {
        #[serde(default)]
        platform: Option<String>,
        conditions: Vec<ConditionRecord>,
    },
    Or {
        #[serde(default)]
        platform: Option<String>,
        conditions: Vec<ConditionRecord>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YouTube {
    pub id: String,
    pub title: String,
}

/// Boolean combinator of a compound condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }

    pub fn swapped(self) -> Self {
        match self {
            Combinator::And => Combinator::Or,
            Combinator::Or => Combinator::And,
        }
    }
}

/// `type` tag of exported condition data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    Simple,
    And,
    Or,
}

/// Leaf of a condition tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    /// Unique across all checks
    pub id: String,
    /// Registered check tool id
    pub tool: String,
    /// Raw tool name when the tool is not registered (then `tool` is `misc`)
    pub tool_display_name: Option<String>,
    pub procedure: Localized,
    pub note: Option<Localized>,
    pub youtube: Option<YouTube>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionNode {
    Simple(Procedure),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub platform: Option<String>,
    pub node: ConditionNode,
}

/// Exported form of a condition, used by the JSON and check-sheet outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionData {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<ProcedureData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ConditionData>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureData {
    pub id: String,
    pub platform: Option<String>,
    pub tool: String,
    #[serde(rename = "toolLink")]
    pub tool_link: ToolLink,
    pub procedure: Localized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLink {
    pub text: Localized,
    pub url: Localized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionTemplate {
    pub platform: String,
    pub condition: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<ProcedureTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureTemplate {
    pub id: String,
    pub tool_display_name: String,
    pub procedure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "YouTube", skip_serializing_if = "Option::is_none")]
    pub youtube: Option<YouTube>,
}

/// Visitor over a condition tree
pub trait ConditionVisitor {
    type Output;

    fn visit_simple(&mut self, procedure: &Procedure) -> Self::Output;

    fn visit_compound(&mut self, combinator: Combinator, conditions: &[Condition]) -> Self::Output;
}

impl Procedure {
    /// Localized tool name, or the raw name of an unregistered tool
    pub fn tool_name<'a>(&'a self, corpus: &'a Corpus, lang: &str) -> &'a str {
        if let Some(name) = &self.tool_display_name {
            return name;
        }
        corpus
            .get::<CheckTool>(&self.tool)
            .map(|tool| tool.get_name(lang))
            .unwrap_or(&self.tool)
    }

    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> ProcedureTemplate {
        ProcedureTemplate {
            id: self.id.clone(),
            tool_display_name: self.tool_name(corpus, lang).to_string(),
            procedure: self.procedure.text(lang).to_string(),
            note: self.note.as_ref().map(|note| note.text(lang).to_string()),
            youtube: self.youtube.clone(),
        }
    }

    pub fn object_data(&self, corpus: &Corpus, platform: Option<&str>) -> ProcedureData {
        let mut text = Localized::new();
        let mut url = Localized::new();
        for lang in self.procedure.languages() {
            text.insert(lang, self.tool_name(corpus, lang));
            url.insert(
                lang,
                format!("{}{}.html#{}", corpus.settings().examples_url(lang), self.tool, self.id),
            );
        }
        ProcedureData {
            id: self.id.clone(),
            platform: platform.map(str::to_string),
            tool: self.tool.clone(),
            tool_link: ToolLink { text, url },
            procedure: self.procedure.clone(),
        }
    }
}

impl Condition {
    pub fn accept<V: ConditionVisitor>(&self, visitor: &mut V) -> V::Output {
        match &self.node {
            ConditionNode::Simple(procedure) => visitor.visit_simple(procedure),
            ConditionNode::And(conditions) => visitor.visit_compound(Combinator::And, conditions),
            ConditionNode::Or(conditions) => visitor.visit_compound(Combinator::Or, conditions),
        }
    }

    pub fn kind(&self) -> ConditionType {
        match &self.node {
            ConditionNode::Simple(_) => ConditionType::Simple,
            ConditionNode::And(_) => ConditionType::And,
            ConditionNode::Or(_) => ConditionType::Or,
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.node, ConditionNode::Simple(_))
    }

    /// Child conditions of a compound node; empty for leaves
    pub fn children(&self) -> &[Condition] {
        match &self.node {
            ConditionNode::Simple(_) => &[],
            ConditionNode::And(conditions) | ConditionNode::Or(conditions) => conditions,
        }
    }

    /// Every leaf procedure, depth first
    pub fn procedures(&self) -> Vec<&Procedure> {
        match &self.node {
            ConditionNode::Simple(procedure) => vec![procedure],
            ConditionNode::And(conditions) | ConditionNode::Or(conditions) => {
                conditions.iter().flat_map(Condition::procedures).collect()
            }
        }
    }

    /// Sentence describing when the condition holds
    pub fn summary(&self, messages: &MessageCatalog, lang: &str) -> String {
        let singular = messages.pass_text("singular", lang);
        let (combinator, conditions) = match &self.node {
            ConditionNode::Simple(procedure) => return format!("{}{}", procedure.id, singular),
            ConditionNode::And(conditions) => (Combinator::And, conditions),
            ConditionNode::Or(conditions) => (Combinator::Or, conditions),
        };

        let simple: Vec<String> = conditions
            .iter()
            .filter(|c| c.is_simple())
            .map(|c| c.summary(messages, lang))
            .collect();
        let complex: Vec<String> = conditions
            .iter()
            .filter(|c| !c.is_simple())
            .map(|c| format!("({})", c.summary(messages, lang)))
            .collect();

        let separator = messages.separator(combinator.as_str(), lang);
        let connector = messages.conjunction(combinator.as_str(), lang);
        let pass = match combinator {
            Combinator::And => messages.pass_text("plural", lang),
            Combinator::Or => singular,
        };

        if simple.len() > 1 {
            let stripped: Vec<String> = simple.iter().map(|s| s.replace(singular, "")).collect();
            let simple_summary = format!("{}{}", stripped.join(separator), pass);
            if complex.is_empty() {
                simple_summary
            } else {
                format!("{simple_summary}{connector}{}", complex.join(connector))
            }
        } else {
            simple.into_iter().chain(complex).collect::<Vec<_>>().join(connector)
        }
    }

    /// Document projection; conditions without a platform have none
    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> Option<ConditionTemplate> {
        let platform = self.platform.as_deref()?;
        Some(ConditionTemplate {
            platform: corpus.messages().platform_name(platform, lang).to_string(),
            condition: self.summary(corpus.messages(), lang),
            procedures: self
                .procedures()
                .into_iter()
                .map(|procedure| procedure.template_data(corpus, lang))
                .collect(),
        })
    }

    /// Exported form; the platform is inherited from the parent when unset
    /// and emitted only at the top level and on leaves
    pub fn object_data(&self, corpus: &Corpus, parent_platform: Option<&str>, is_top: bool) -> ConditionData {
        let platform = self.platform.as_deref().or(parent_platform);
        let emitted = platform.filter(|_| is_top || self.is_simple()).map(str::to_string);

        match &self.node {
            ConditionNode::Simple(procedure) => ConditionData {
                kind: ConditionType::Simple,
                platform: emitted,
                procedure: Some(procedure.object_data(corpus, platform)),
                conditions: None,
            },
            ConditionNode::And(conditions) | ConditionNode::Or(conditions) => ConditionData {
                kind: self.kind(),
                platform: emitted,
                procedure: None,
                conditions: Some(
                    conditions
                        .iter()
                        .map(|c| c.object_data(corpus, platform, false))
                        .collect(),
                ),
            },
        }
    }
}

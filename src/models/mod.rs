//! Entity types of the guidelines corpus
//!
//! Each entity registers itself in the [`Corpus`](crate::corpus::Corpus)
//! through a constructor in its own module and exposes serializable
//! projections for renderers.

mod axe;
mod category;
mod check;
mod check_tool;
mod condition;
mod faq;
mod faq_tag;
mod guideline;
mod reference;

pub use axe::{tag2sc, AxeLocale, AxeLocaleMessage, AxeMetadata, AxeRule, AxeRuleData, AxeRuleMetadata, AxeRuleTemplate};
pub use category::Category;
pub use check::{
    Check, CheckData, CheckObjectData, CheckTarget, CheckTemplate, ConditionStatement, Implementation,
    ImplementationTemplate, Method, MethodTemplate, Severity,
};
pub use check_tool::{CheckTool, Example, ExampleGroup, ExampleTemplate};
pub use condition::{
    Combinator, Condition, ConditionData, ConditionNode, ConditionRecord, ConditionTemplate, ConditionType,
    ConditionVisitor, Procedure, ProcedureData, ProcedureTemplate, ToolLink, YouTube,
};
pub use faq::{Faq, FaqData, FaqSort, FaqTemplate};
pub use faq_tag::{FaqTag, FaqTagSort, FaqTagTemplate};
pub use guideline::{Guideline, GuidelineData, GuidelineTemplate};
pub use reference::{InfoRef, Level, ScText, WcagSc, WcagScRecord, WcagScTemplate};

use serde::{Deserialize, Serialize};

use crate::localized::Localized;

/// Localized link text and URL of an entity's published page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub text: Localized,
    pub url: Localized,
}

/// `{category, guideline}` pair used when listing guidelines under other entities
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryAndId {
    pub category: String,
    pub guideline: String,
}

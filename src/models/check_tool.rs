use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::corpus::Corpus;
use crate::error::Result;
use crate::localized::Localized;
use crate::models::{Check, Procedure, ProcedureTemplate};
use crate::registry::{Entity, EntityKind};

/// Tool a check procedure is carried out with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTool {
    pub id: String,
    pub names: Localized,
    pub examples: Vec<Example>,
}

/// A procedure that uses a tool, by check and procedure id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub check_id: String,
    pub procedure_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleTemplate {
    #[serde(flatten)]
    pub procedure: ProcedureTemplate,
    pub tool: String,
    pub check_id: String,
    pub check_text: String,
}

/// Examples of one check, as listed on a tool's page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleGroup {
    pub check_id: String,
    pub check_text: String,
    pub tool: String,
    pub procedures: Vec<ProcedureTemplate>,
}

impl Entity for CheckTool {
    const KIND: EntityKind = EntityKind::CheckTool;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Example {
    fn resolve<'a>(&self, corpus: &'a Corpus) -> Option<(&'a Check, &'a Procedure)> {
        let check = corpus.get::<Check>(&self.check_id)?;
        let procedure = check.procedures().into_iter().find(|p| p.id == self.procedure_id)?;
        Some((check, procedure))
    }

    pub fn template_data(&self, corpus: &Corpus, lang: &str) -> Option<ExampleTemplate> {
        let (check, procedure) = self.resolve(corpus)?;
        Some(ExampleTemplate {
            procedure: procedure.template_data(corpus, lang),
            tool: procedure.tool.clone(),
            check_id: check.id.clone(),
            check_text: check.check.text(lang).to_string(),
        })
    }
}

impl CheckTool {
    pub fn get_name(&self, lang: &str) -> &str {
        self.names.text(lang)
    }

    /// Examples grouped by check, ordered by check id
    pub fn example_template_data(&self, corpus: &Corpus, lang: &str) -> Vec<ExampleGroup> {
        let mut groups: BTreeMap<&str, ExampleGroup> = BTreeMap::new();
        for example in &self.examples {
            let Some((check, procedure)) = example.resolve(corpus) else {
                continue;
            };
            groups
                .entry(example.check_id.as_str())
                .or_insert_with(|| ExampleGroup {
                    check_id: check.id.clone(),
                    check_text: check.check.text(lang).to_string(),
                    tool: self.id.clone(),
                    procedures: Vec::new(),
                })
                .procedures
                .push(procedure.template_data(corpus, lang));
        }
        groups.into_values().collect()
    }

    /// Source files of the checks that use this tool
    pub fn dependencies(&self, corpus: &Corpus) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for example in &self.examples {
            let path = corpus.get::<Check>(&example.check_id).and_then(|check| check.src_path());
            if let Some(path) = path {
                if !paths.iter().any(|p| p == path) {
                    paths.push(path.to_path_buf());
                }
            }
        }
        paths
    }
}

impl Corpus {
    pub fn add_check_tool(&mut self, id: &str, names: Localized) -> Result<&CheckTool> {
        let names = self.localize(names);
        self.check_tools.insert(CheckTool {
            id: id.to_string(),
            names,
            examples: Vec::new(),
        })
    }

    pub(crate) fn add_example(&mut self, tool_id: &str, example: Example) {
        if let Some(tool) = self.check_tools.get_mut(tool_id) {
            tool.examples.push(example);
        }
    }
}

//! Spreadsheet formulas for condition trees
//!
//! The check sheet lists one row per procedure with a result cell. A check's
//! overall result is a formula over those cells that reproduces its condition
//! tree:
//!
//! ```text
//! =IF(COUNTIF($F$10:$F$11,"UNCHECKED")=2,"",IF(AND(TO_TEXT($F$10)="TRUE",TO_TEXT($F$11)="TRUE"),"PASS","FAIL"))
//! ```
//!
//! The outer `IF` leaves the cell empty while every procedure is unchecked.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{GuidelineError, Result};
use crate::messages::MessageCatalog;
use crate::models::{Combinator, Condition, ConditionVisitor, Procedure};

/// Columns holding the check and procedure ids
pub const ID_COLUMNS: usize = 2;

/// Sheet layout variant, one per check target and platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetProfile {
    DesignWeb,
    DesignMobile,
    CodeWeb,
    CodeMobile,
    ProductWeb,
    ProductIos,
    ProductAndroid,
}

impl TargetProfile {
    pub const ALL: [TargetProfile; 7] = [
        TargetProfile::DesignWeb,
        TargetProfile::DesignMobile,
        TargetProfile::CodeWeb,
        TargetProfile::CodeMobile,
        TargetProfile::ProductWeb,
        TargetProfile::ProductIos,
        TargetProfile::ProductAndroid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetProfile::DesignWeb => "designWeb",
            TargetProfile::DesignMobile => "designMobile",
            TargetProfile::CodeWeb => "codeWeb",
            TargetProfile::CodeMobile => "codeMobile",
            TargetProfile::ProductWeb => "productWeb",
            TargetProfile::ProductIos => "productIos",
            TargetProfile::ProductAndroid => "productAndroid",
        }
    }

    /// Formula-generated columns between the ids and the result column
    pub fn generated_data_columns(self) -> usize {
        match self {
            TargetProfile::ProductWeb | TargetProfile::ProductIos | TargetProfile::ProductAndroid => 2,
            _ => 0,
        }
    }

    /// Letter of the column procedure results are entered in
    pub fn result_column(self) -> String {
        column_letter(ID_COLUMNS + self.generated_data_columns())
    }
}

impl fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetProfile {
    type Err = GuidelineError;

    fn from_str(s: &str) -> Result<Self> {
        TargetProfile::ALL
            .into_iter()
            .find(|profile| profile.as_str() == s)
            .ok_or_else(|| GuidelineError::Data(format!("unknown target profile: {s}")))
    }
}

/// Spreadsheet column letters for a zero-based index: 0 is `A`, 26 is `AA`
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Record `row` for every procedure of `condition`
pub fn collect_rows(condition: &Condition, row: u32, id_to_row: &mut HashMap<String, u32>) {
    for procedure in condition.procedures() {
        id_to_row.insert(procedure.id.clone(), row);
    }
}

/// Translates condition trees into result formulas for one language and column
#[derive(Debug, Clone)]
pub struct ConditionTranslator<'a> {
    messages: &'a MessageCatalog,
    lang: String,
    column: String,
}

impl<'a> ConditionTranslator<'a> {
    pub fn new(messages: &'a MessageCatalog, lang: &str, profile: TargetProfile) -> Self {
        Self::with_column(messages, lang, &profile.result_column())
    }

    pub fn with_column(messages: &'a MessageCatalog, lang: &str, column: &str) -> Self {
        Self {
            messages,
            lang: lang.to_string(),
            column: column.to_string(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    fn cell(&self, row: u32) -> String {
        format!("${}${}", self.column, row)
    }

    fn row_of(id_to_row: &HashMap<String, u32>, procedure: &Procedure) -> Result<u32> {
        id_to_row
            .get(&procedure.id)
            .copied()
            .ok_or_else(|| GuidelineError::Data(format!("no sheet row for procedure {}", procedure.id)))
    }

    /// Complete cell formula for `condition`
    pub fn formula(&self, condition: &Condition, id_to_row: &HashMap<String, u32>) -> Result<String> {
        let unchecked = self.unchecked_predicate(condition, id_to_row)?;
        let pass = self.predicate(condition, id_to_row, false)?;
        Ok(format!(
            "=IF({unchecked},IF({pass},\"{}\",\"{}\"))",
            self.messages.final_result("pass", &self.lang),
            self.messages.final_result("fail", &self.lang)
        ))
    }

    /// Boolean expression that holds when `condition` passes; `reverse`
    /// swaps AND and OR
    pub fn predicate(&self, condition: &Condition, id_to_row: &HashMap<String, u32>, reverse: bool) -> Result<String> {
        let mut visitor = PredicateVisitor {
            translator: self,
            id_to_row,
            phrase: self.messages.check_result("pass", &self.lang),
            reverse,
        };
        condition.accept(&mut visitor)
    }

    /// `COUNTIF(range,"<unchecked>")=n,""` over the procedure rows, ascending
    pub fn unchecked_predicate(&self, condition: &Condition, id_to_row: &HashMap<String, u32>) -> Result<String> {
        let mut rows = condition
            .procedures()
            .into_iter()
            .map(|procedure| Self::row_of(id_to_row, procedure))
            .collect::<Result<Vec<u32>>>()?;
        rows.sort_unstable();
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return Err(GuidelineError::Data("condition has no procedures".to_string()));
        };
        Ok(format!(
            "COUNTIF({}:{},\"{}\")={},\"\"",
            self.cell(*first),
            self.cell(*last),
            self.messages.check_result("unchecked", &self.lang),
            rows.len()
        ))
    }
}

struct PredicateVisitor<'t, 'a> {
    translator: &'t ConditionTranslator<'a>,
    id_to_row: &'t HashMap<String, u32>,
    phrase: &'t str,
    reverse: bool,
}

impl ConditionVisitor for PredicateVisitor<'_, '_> {
    type Output = Result<String>;

    fn visit_simple(&mut self, procedure: &Procedure) -> Self::Output {
        let row = ConditionTranslator::row_of(self.id_to_row, procedure)?;
        Ok(format!("TO_TEXT({})=\"{}\"", self.translator.cell(row), self.phrase))
    }

    fn visit_compound(&mut self, combinator: Combinator, conditions: &[Condition]) -> Self::Output {
        let ordered = conditions
            .iter()
            .filter(|c| c.is_simple())
            .chain(conditions.iter().filter(|c| !c.is_simple()));
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in ordered {
            parts.push(condition.accept(self)?);
        }
        let combinator = if self.reverse { combinator.swapped() } else { combinator };
        Ok(format!("{}({})", combinator.as_str().to_uppercase(), parts.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConditionNode;
    use pretty_assertions::assert_eq;

    fn leaf(id: &str) -> Condition {
        Condition {
            platform: None,
            node: ConditionNode::Simple(Procedure {
                id: id.to_string(),
                tool: "nvda".to_string(),
                tool_display_name: None,
                procedure: [("ja", "確認する")].into_iter().collect(),
                note: None,
                youtube: None,
            }),
        }
    }

    fn rows(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(id, row)| (id.to_string(), *row)).collect()
    }

    #[test]
    fn test_single_procedure_formula() {
        let messages = MessageCatalog::builtin();
        let translator = ConditionTranslator::with_column(&messages, "ja", "F");
        let formula = translator.formula(&leaf("0001-nvda-01"), &rows(&[("0001-nvda-01", 10)])).unwrap();
        assert_eq!(
            formula,
            "=IF(COUNTIF($F$10:$F$10,\"未チェック\")=1,\"\",IF(TO_TEXT($F$10)=\"はい\",\"OK\",\"NG\"))"
        );
    }

    #[test]
    fn test_and_of_two_procedures() {
        let messages = MessageCatalog::builtin();
        let translator = ConditionTranslator::with_column(&messages, "en", "F");
        let cond = Condition {
            platform: Some("web".to_string()),
            node: ConditionNode::And(vec![leaf("a"), leaf("b")]),
        };
        let id_to_row = rows(&[("a", 10), ("b", 11)]);
        assert_eq!(
            translator.predicate(&cond, &id_to_row, false).unwrap(),
            "AND(TO_TEXT($F$10)=\"TRUE\",TO_TEXT($F$11)=\"TRUE\")"
        );
        assert_eq!(
            translator.unchecked_predicate(&cond, &id_to_row).unwrap(),
            "COUNTIF($F$10:$F$11,\"UNCHECKED\")=2,\"\""
        );
        assert_eq!(
            translator.formula(&cond, &id_to_row).unwrap(),
            "=IF(COUNTIF($F$10:$F$11,\"UNCHECKED\")=2,\"\",IF(AND(TO_TEXT($F$10)=\"TRUE\",TO_TEXT($F$11)=\"TRUE\"),\"PASS\",\"FAIL\"))"
        );
    }

    #[test]
    fn test_nested_simple_children_first_and_reverse() {
        let messages = MessageCatalog::builtin();
        let translator = ConditionTranslator::new(&messages, "en", TargetProfile::CodeWeb);
        let cond = Condition {
            platform: None,
            node: ConditionNode::Or(vec![
                Condition {
                    platform: None,
                    node: ConditionNode::And(vec![leaf("b"), leaf("c")]),
                },
                leaf("a"),
            ]),
        };
        let id_to_row = rows(&[("a", 7), ("b", 5), ("c", 6)]);
        assert_eq!(
            translator.predicate(&cond, &id_to_row, false).unwrap(),
            "OR(TO_TEXT($C$7)=\"TRUE\",AND(TO_TEXT($C$5)=\"TRUE\",TO_TEXT($C$6)=\"TRUE\"))"
        );
        assert_eq!(
            translator.predicate(&cond, &id_to_row, true).unwrap(),
            "AND(TO_TEXT($C$7)=\"TRUE\",OR(TO_TEXT($C$5)=\"TRUE\",TO_TEXT($C$6)=\"TRUE\"))"
        );
        assert_eq!(
            translator.unchecked_predicate(&cond, &id_to_row).unwrap(),
            "COUNTIF($C$5:$C$7,\"UNCHECKED\")=3,\"\""
        );
    }

    #[test]
    fn test_missing_row_is_error() {
        let messages = MessageCatalog::builtin();
        let translator = ConditionTranslator::with_column(&messages, "en", "E");
        let err = translator.formula(&leaf("x"), &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("x"));
    }

    #[test]
    fn test_result_columns() {
        assert_eq!(TargetProfile::DesignWeb.result_column(), "C");
        assert_eq!(TargetProfile::CodeMobile.result_column(), "C");
        assert_eq!(TargetProfile::ProductWeb.result_column(), "E");
        assert_eq!(TargetProfile::ProductAndroid.result_column(), "E");
        assert_eq!("productIos".parse::<TargetProfile>().unwrap(), TargetProfile::ProductIos);
        assert!("product".parse::<TargetProfile>().is_err());
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
    }

    #[test]
    fn test_collect_rows() {
        let cond = Condition {
            platform: None,
            node: ConditionNode::And(vec![leaf("a"), leaf("b")]),
        };
        let mut id_to_row = HashMap::new();
        collect_rows(&cond, 12, &mut id_to_row);
        assert_eq!(id_to_row, rows(&[("a", 12), ("b", 12)]));
    }
}

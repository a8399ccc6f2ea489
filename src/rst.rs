//! reStructuredText inline markup in exported text
//!
//! Text meant for the JSON export and the check sheet must not carry Sphinx
//! roles. `:ref:` labels become the link text of the referenced document,
//! `:kbd:` roles their content. Japanese text additionally loses the spaces
//! that source files put between Japanese and ASCII words.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::corpus::Corpus;
use crate::localized::Localized;
use crate::models::{ConditionData, LinkData};

fn ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":ref:`([-a-z0-9]+)`").expect("valid regex"))
}

fn kbd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":kbd:`([^`]+)`").expect("valid regex"))
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[ \t]*[*+-][ \t]+").expect("valid regex"))
}

const FULLWIDTH: &str = r"[\u{3000}-\u{303F}\u{3040}-\u{309F}\u{30A0}-\u{30FF}\u{4E00}-\u{9FFF}\u{FF01}-\u{FF60}]";
const HALFWIDTH: &str = r"[!-~\u{FF61}-\u{FFDC}\u{FFE8}-\u{FFEE}]";
const SPACE: &str = r"[ \t\u{00A0}\u{2000}-\u{200A}\u{202F}\u{205F}]+";

fn spacing_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(&format!("({FULLWIDTH}){SPACE}({FULLWIDTH})")).expect("valid regex"),
            Regex::new(&format!("({FULLWIDTH}){SPACE}({HALFWIDTH})")).expect("valid regex"),
            Regex::new(&format!("({HALFWIDTH}){SPACE}({FULLWIDTH})")).expect("valid regex"),
        ]
    })
}

/// Remove spaces next to Japanese characters in one line
fn normalize_line(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let mut next = current.clone();
        for pattern in spacing_patterns() {
            next = pattern.replace_all(&next, "$1$2").into_owned();
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Normalize spacing in Japanese text; list items and their indented
/// continuation lines are kept as written
pub fn normalize_japanese(text: &str) -> String {
    let mut in_list = false;
    let mut has_list = false;
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            if bullet_pattern().is_match(line) {
                in_list = true;
                has_list = true;
                return line.to_string();
            }
            if in_list && (line.starts_with(' ') || line.starts_with('\t')) {
                return line.to_string();
            }
            in_list = false;
            normalize_line(line)
        })
        .collect();
    let joined = lines.join("\n");
    if has_list {
        joined.trim_end().to_string()
    } else {
        joined.trim().to_string()
    }
}

/// Resolves inline roles using the link texts of internal references
#[derive(Debug, Clone, Default)]
pub struct RstProcessor {
    labels: HashMap<String, Localized>,
}

impl RstProcessor {
    pub fn new(labels: HashMap<String, Localized>) -> Self {
        Self { labels }
    }

    /// Link texts of every internal reference with a known link
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let labels = corpus
            .info_refs()
            .iter()
            .filter(|info| info.internal)
            .filter_map(|info| info.link_data().map(|link| (info.reference.clone(), link.text.clone())))
            .collect();
        Self { labels }
    }

    /// Add or replace the text of one label
    pub fn insert_link(&mut self, label: &str, link: &LinkData) {
        self.labels.insert(label.to_string(), link.text.clone());
    }

    pub fn process_text(&self, text: &str, lang: &str) -> String {
        let text = ref_pattern().replace_all(text, |caps: &Captures<'_>| {
            let label = &caps[1];
            self.labels
                .get(label)
                .and_then(|texts| texts.get(lang))
                .unwrap_or(label)
                .to_string()
        });
        let text = kbd_pattern().replace_all(&text, "$1");
        if lang == "ja" {
            normalize_japanese(&text)
        } else {
            text.into_owned()
        }
    }

    pub fn process_localized(&self, text: &Localized) -> Localized {
        text.map(|lang, value| self.process_text(value, lang))
    }

    /// Resolve markup in every procedure text of a condition tree
    pub fn process_condition(&self, condition: &mut ConditionData) {
        if let Some(procedure) = condition.procedure.as_mut() {
            procedure.procedure = self.process_localized(&procedure.procedure);
        }
        if let Some(children) = condition.conditions.as_mut() {
            for child in children {
                self.process_condition(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConditionType, ProcedureData, ToolLink};
    use pretty_assertions::assert_eq;

    fn processor() -> RstProcessor {
        let mut labels = HashMap::new();
        labels.insert(
            "exp-screen-reader-check-nvda".to_string(),
            [("ja", "NVDAでの確認方法"), ("en", "How to check with NVDA")]
                .into_iter()
                .collect(),
        );
        RstProcessor::new(labels)
    }

    #[test]
    fn test_ref_resolution() {
        let rst = processor();
        assert_eq!(
            rst.process_text("See :ref:`exp-screen-reader-check-nvda`.", "en"),
            "See How to check with NVDA."
        );
        assert_eq!(rst.process_text("See :ref:`unknown-label`.", "en"), "See unknown-label.");
    }

    #[test]
    fn test_kbd_role() {
        assert_eq!(processor().process_text("Press :kbd:`Tab` twice", "en"), "Press Tab twice");
    }

    #[test]
    fn test_japanese_spacing() {
        assert_eq!(normalize_japanese("NVDA で 読み上げ を確認する"), "NVDAで読み上げを確認する");
        assert_eq!(normalize_japanese("  画面 の確認  "), "画面の確認");
        assert_eq!(normalize_japanese("keep english words"), "keep english words");
        assert_eq!(
            processor().process_text(":ref:`exp-screen-reader-check-nvda` を参照", "ja"),
            "NVDAでの確認方法を参照"
        );
    }

    #[test]
    fn test_bullet_lines_preserved() {
        let text = "手順 は以下\n* 画面 を開く\n  続き の 行\n最後 の行\n";
        assert_eq!(
            normalize_japanese(text),
            "手順は以下\n* 画面 を開く\n  続き の 行\n最後の行"
        );
    }

    #[test]
    fn test_process_condition_recurses() {
        let leaf = |text: &str| ConditionData {
            kind: ConditionType::Simple,
            platform: None,
            procedure: Some(ProcedureData {
                id: "p".to_string(),
                platform: None,
                tool: "nvda".to_string(),
                tool_link: ToolLink {
                    text: Localized::new(),
                    url: Localized::new(),
                },
                procedure: [("en", text)].into_iter().collect(),
            }),
            conditions: None,
        };
        let mut condition = ConditionData {
            kind: ConditionType::And,
            platform: Some("web".to_string()),
            procedure: None,
            conditions: Some(vec![leaf("Press :kbd:`Enter`")]),
        };
        processor().process_condition(&mut condition);
        let children = condition.conditions.unwrap();
        assert_eq!(
            children[0].procedure.as_ref().unwrap().procedure.get("en"),
            Some("Press Enter")
        );
    }
}

//! Loading tests against the fixture corpus in `tests/fixtures/corpus`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use a11y_guidelines::info_links::{resolve_info_links, StaticLabels};
use a11y_guidelines::models::CheckObjectData;
use a11y_guidelines::{
    AxeRule, Check, ConditionTranslator, Corpus, EntityKey, EntityKind, Faq, Guideline, GuidelineError,
    InfoRef, Settings, TargetProfile, ValidationMode, VersionInfo,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus")
}

fn settings(mode: ValidationMode) -> Settings {
    let mut settings = Settings::default();
    settings.validation.yaml_validation = mode;
    settings
}

fn load() -> Corpus {
    Corpus::initialize(fixture_dir(), settings(ValidationMode::Strict)).unwrap()
}

/// Writable copy of the fixture corpus
fn copy_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = fixture_dir();
    for entry in WalkDir::new(&src) {
        let entry = entry.unwrap();
        let target = dir.path().join(entry.path().strip_prefix(&src).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
    dir
}

const CHECK_WITHOUT_EN: &str = r#"
id: '0002'
sortKey: 100200
check:
  ja: 装飾画像のalt属性が空である
severity: major
target: code
platform:
  - web
"#;

#[test]
fn test_fixture_corpus_counts() {
    let corpus = load();
    assert_eq!(corpus.count(EntityKind::Category), 2);
    assert_eq!(corpus.count(EntityKind::WcagSc), 2);
    assert_eq!(corpus.count(EntityKind::Guideline), 1);
    assert_eq!(corpus.count(EntityKind::Check), 2);
    assert_eq!(corpus.count(EntityKind::Faq), 2);
    assert_eq!(corpus.count(EntityKind::FaqTag), 2);
    assert_eq!(corpus.count(EntityKind::AxeRule), 2);
    assert_eq!(corpus.count(EntityKind::InfoRef), 3);
}

#[test]
fn test_initialize_is_repeatable() {
    let (first, second) = (load(), load());
    assert!(first == second);
    assert_eq!(
        serde_json::to_value(Check::object_data_all(&first)).unwrap(),
        serde_json::to_value(Check::object_data_all(&second)).unwrap()
    );
}

#[test]
fn test_relationships_are_symmetric() {
    let corpus = load();
    let guideline = EntityKey::new(EntityKind::Guideline, "gl-image-text-alternative");

    let checks: Vec<_> = corpus
        .related_sorted_by::<Check, _, _>(&guideline, |check| check.id.clone())
        .into_iter()
        .map(|check| check.id.as_str())
        .collect();
    assert_eq!(checks, ["0001", "0411"]);

    for id in ["0001", "0411"] {
        let check = EntityKey::new(EntityKind::Check, id);
        let guidelines: Vec<_> = corpus
            .related::<Guideline>(&check)
            .into_iter()
            .map(|gl| gl.id.as_str())
            .collect();
        assert_eq!(guidelines, ["gl-image-text-alternative"]);
    }

    let p0001 = EntityKey::new(EntityKind::Faq, "p0001");
    let p0002 = EntityKey::new(EntityKind::Faq, "p0002");
    assert_eq!(corpus.related::<Faq>(&p0001)[0].id, "p0002");
    assert_eq!(corpus.related::<Faq>(&p0002)[0].id, "p0001");
}

#[test]
fn test_guideline_page_data() {
    let corpus = load();
    let guideline = corpus.get::<Guideline>("gl-image-text-alternative").unwrap();
    let page = guideline.template_data(&corpus, "ja");

    assert_eq!(page.title, "代替テキスト");
    assert_eq!(page.category, "画像");
    let checks: Vec<_> = page.checks.iter().map(|check| check.id.as_str()).collect();
    assert_eq!(checks, ["0001", "0411"]);
    let scs: Vec<_> = page.scs.iter().map(|sc| sc.sc.as_str()).collect();
    assert_eq!(scs, ["1.1.1", "1.4.5"]);
    assert_eq!(page.faqs, Some(vec!["p0001".to_string()]));
    assert_eq!(page.info.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_faq_page_data() {
    let corpus = load();
    let faq = corpus.get::<Faq>("p0002").unwrap();

    let ja = faq.template_data(&corpus, "ja");
    assert_eq!(ja.updated_str, "2023年6月15日");
    assert_eq!(ja.related_faqs, Some(vec!["p0001".to_string()]));
    assert_eq!(ja.guidelines, None);

    let en = corpus.get::<Faq>("p0001").unwrap().template_data(&corpus, "en");
    assert_eq!(en.updated_str, "April 1, 2023");
    assert_eq!(en.tags, ["alt"]);
    let checks: Vec<_> = en.checks.unwrap().into_iter().map(|check| check.id).collect();
    assert_eq!(checks, ["0001"]);
}

#[test]
fn test_axe_rules_from_worktree() {
    let corpus = load();
    let metadata = corpus.axe_metadata().unwrap();
    assert_eq!(metadata.version, "4.8.2");
    assert_eq!(metadata.major_version, "4.8");
    assert_eq!(metadata.timestamp, None);

    let image_alt = corpus.get::<AxeRule>("image-alt").unwrap();
    assert!(image_alt.translated);
    assert!(image_alt.has_wcag_sc);
    assert!(image_alt.has_guideline);
    assert_eq!(image_alt.help.get("ja"), Some("画像には代替テキストがなければなりません"));

    let region = corpus.get::<AxeRule>("region").unwrap();
    assert!(!region.translated);
    assert!(!region.has_wcag_sc);
    assert_eq!(region.help.get("ja"), Some("All page content should be contained by landmarks"));

    let listed: Vec<_> = corpus.axe_rules_listed().iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(listed, ["image-alt", "region"]);
}

#[test]
fn test_missing_axe_tree_is_tolerated() {
    let dir = copy_fixture();
    fs::remove_dir_all(dir.path().join("vendor")).unwrap();
    let corpus = Corpus::initialize(dir.path(), settings(ValidationMode::Strict)).unwrap();
    assert_eq!(corpus.count(EntityKind::AxeRule), 0);
    assert!(corpus.axe_metadata().is_none());
}

#[test]
fn test_corrupt_axe_rule_is_fatal() {
    let dir = copy_fixture();
    fs::write(dir.path().join("vendor/axe-core/lib/rules/region.json"), "{ not json").unwrap();

    let err = Corpus::initialize(dir.path(), settings(ValidationMode::Strict)).unwrap_err();
    let GuidelineError::InFile { path, .. } = err else {
        panic!("expected file context");
    };
    assert_eq!(path, dir.path().join("vendor/axe-core"));
}

#[test]
fn test_added_language_falls_back_to_default() {
    let mut settings = settings(ValidationMode::Strict);
    settings.languages.available = vec!["ja".to_string(), "en".to_string(), "ko".to_string()];
    let corpus = Corpus::initialize(fixture_dir(), settings).unwrap();

    let image_alt = corpus.get::<AxeRule>("image-alt").unwrap().template_data(&corpus, "ko");
    assert_eq!(image_alt.help, "画像には代替テキストがなければなりません");
    let region = corpus.get::<AxeRule>("region").unwrap().template_data(&corpus, "ko");
    assert_eq!(region.help, "All page content should be contained by landmarks");

    let guideline = corpus.get::<Guideline>("gl-image-text-alternative").unwrap();
    assert_eq!(guideline.template_data(&corpus, "ko").title, "代替テキスト");
}

#[test]
fn test_missing_implementation_text_uses_default_language() {
    let dir = copy_fixture();
    let path = dir.path().join("data/yaml/checks/code/0001.yaml");
    let contents = fs::read_to_string(&path)
        .unwrap()
        .replace("      en: Alternative text for img elements\n", "");
    fs::write(&path, contents).unwrap();

    let corpus = Corpus::initialize(dir.path(), settings(ValidationMode::Disabled)).unwrap();
    let export = serde_json::to_value(Check::object_data_all(&corpus)).unwrap();
    assert_eq!(
        export["0001"]["implementation_web"]["en"],
        "img要素の代替テキスト:\nSpecify the alt attribute\n\n"
    );
}

#[test]
fn test_every_condition_has_formula_rows() {
    let corpus = load();
    for check in corpus.all::<Check>() {
        let rows: HashMap<String, u32> = check
            .procedures()
            .into_iter()
            .zip(2..)
            .map(|(procedure, row)| (procedure.id.clone(), row))
            .collect();
        for lang in ["ja", "en"] {
            let translator = ConditionTranslator::new(corpus.messages(), lang, TargetProfile::ProductWeb);
            for condition in &check.conditions {
                let formula = translator.formula(condition, &rows);
                assert!(formula.is_ok(), "check {} ({lang}): {formula:?}", check.id);
            }
        }
    }
}

fn has_japanese(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c, '\u{3000}'..='\u{30ff}' | '\u{4e00}'..='\u{9fff}' | '\u{ff00}'..='\u{ffef}')
    })
}

#[test]
fn test_templates_use_one_language() {
    let corpus = load();
    let pages = |lang: &str| -> Vec<String> {
        let mut pages = Vec::new();
        for guideline in corpus.all::<Guideline>() {
            pages.push(serde_json::to_string(&guideline.template_data(&corpus, lang)).unwrap());
        }
        for faq in corpus.all::<Faq>() {
            pages.push(serde_json::to_string(&faq.template_data(&corpus, lang)).unwrap());
        }
        for check in corpus.all::<Check>() {
            pages.push(serde_json::to_string(&check.template_data(&corpus, lang, None)).unwrap());
        }
        pages
    };

    for page in pages("en") {
        assert!(!has_japanese(&page), "Japanese text in English page: {page}");
    }
    let english_only = [
        "Alternative Text",
        "Images have appropriate alternative text",
        "Provide alternative text",
        "Testing with screen readers",
        "April 1, 2023",
        "Non-text Content",
        "Miscellaneous Methods",
    ];
    for page in pages("ja") {
        for text in english_only {
            assert!(!page.contains(text), "{text:?} in Japanese page: {page}");
        }
    }
}

#[test]
fn test_page_data_checks_language() {
    let corpus = load();
    let key = EntityKey::new(EntityKind::Faq, "p0001");

    let page = corpus.page_data(&key, "en").unwrap();
    assert_eq!(page["updated_str"], "April 1, 2023");

    let err = corpus.page_data(&key, "fr").unwrap_err();
    assert!(matches!(err, GuidelineError::Configuration(ref message) if message.contains("fr")));

    let missing = EntityKey::new(EntityKind::Check, "9999");
    assert!(matches!(corpus.page_data(&missing, "ja"), Err(GuidelineError::Data(_))));
}

#[test]
fn test_check_export_shape() {
    let corpus = load();
    let export = serde_json::to_value(Check::object_data_all(&corpus)).unwrap();

    let check = &export["0001"];
    assert_eq!(check["severity"], "[CRITICAL]");
    assert_eq!(check["target"], "code");
    assert_eq!(check["sortKey"], 100100);
    assert_eq!(check["guidelines"][0]["text"]["en"], "Images: Alternative Text");
    assert_eq!(
        check["implementation_web"]["en"],
        "Alternative text for img elements:\nSpecify the alt attribute\n\n"
    );
    assert_eq!(check["conditions"][0]["type"], "and");
    assert_eq!(check["conditions"][0]["conditions"][0]["procedure"]["tool"], "axe");

    let product = &export["0411"];
    assert!(product.get("implementation_web").is_none());
    assert_eq!(product["conditions"][0]["procedure"]["tool"], "misc");
    assert_eq!(product["conditionStatements"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_check_export_round_trip() {
    let exported = Check::object_data_all(&load());
    let json = serde_json::to_string(&exported).unwrap();
    let parsed: BTreeMap<String, CheckObjectData> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, exported);
}

#[test]
fn test_check_sheet_formula() {
    let corpus = load();
    let check = corpus.get::<Check>("0411").unwrap();
    let mobile = &check.conditions[1];
    let rows = HashMap::from([("0411-ios-01".to_string(), 10), ("0411-android-01".to_string(), 11)]);

    let translator = ConditionTranslator::with_column(corpus.messages(), "en", "C");
    assert_eq!(
        translator.formula(mobile, &rows).unwrap(),
        "=IF(COUNTIF($C$10:$C$11,\"UNCHECKED\")=2,\"\",IF(OR(TO_TEXT($C$10)=\"TRUE\",TO_TEXT($C$11)=\"TRUE\"),\"PASS\",\"FAIL\"))"
    );
}

#[test]
fn test_internal_reference_links() {
    let mut corpus = load();
    let labels = StaticLabels::from_json_file(&fixture_dir().join("../labels.json")).unwrap();
    assert_eq!(resolve_info_links(&mut corpus, &labels).unwrap(), 1);

    let unresolved: Vec<_> = corpus
        .unresolved_info_refs()
        .iter()
        .map(|info| info.reference.as_str())
        .collect();
    assert_eq!(unresolved, ["exp-screen-reader-check"]);

    let linked = corpus
        .all::<InfoRef>()
        .into_iter()
        .find(|info| info.reference == "exp-text-alternative")
        .unwrap();
    let link = linked.link_data().unwrap();
    assert_eq!(
        link.url.get("en"),
        Some("https://a11y-guidelines.freee.co.jp/en/explanations/text-alternative.html#exp-text-alternative")
    );
}

#[test]
fn test_strict_validation_rejects_document() {
    let dir = copy_fixture();
    fs::write(dir.path().join("data/yaml/checks/code/0002.yaml"), CHECK_WITHOUT_EN).unwrap();

    let err = Corpus::initialize(dir.path(), settings(ValidationMode::Strict)).unwrap_err();
    let GuidelineError::Validation(report) = err else {
        panic!("expected validation error");
    };
    assert!(report.path.ends_with("data/yaml/checks/code/0002.yaml"));
    assert_eq!(report.schema, "check");
    assert_eq!(report.violations[0].message, "'en' is a required property");
}

#[test]
fn test_warning_and_disabled_validation_continue() {
    let dir = copy_fixture();
    fs::write(dir.path().join("data/yaml/checks/code/0002.yaml"), CHECK_WITHOUT_EN).unwrap();

    for mode in [ValidationMode::Warning, ValidationMode::Disabled] {
        let corpus = Corpus::initialize(dir.path(), settings(mode)).unwrap();
        assert_eq!(corpus.count(EntityKind::Check), 3);
        let check = corpus.get::<Check>("0002").unwrap();
        assert_eq!(check.check.get("en"), Some("装飾画像のalt属性が空である"));
    }
}

#[test]
fn test_dangling_reference_names_file() {
    let dir = copy_fixture();
    let path = dir.path().join("data/yaml/gl/image/text-alternative.yaml");
    let contents = fs::read_to_string(&path).unwrap().replace("'0411'", "'9999'");
    fs::write(&path, contents).unwrap();

    let err = Corpus::initialize(dir.path(), settings(ValidationMode::Strict)).unwrap_err();
    let GuidelineError::InFile { path: in_path, source } = err else {
        panic!("expected file context");
    };
    assert_eq!(in_path, path);
    assert!(matches!(
        *source,
        GuidelineError::Reference { kind: EntityKind::Check, ref id, .. } if id == "9999"
    ));
}

#[test]
fn test_version_file() {
    let version = VersionInfo::load(&fixture_dir().join("version.py")).unwrap();
    assert_eq!(version.to_string(), "202304.0 (2023-04-01)");
}

use zawgyi_sweep::{Document, ExecutionMode, HostTree, Pipeline, Settings, SiteRule, TrainedModel};

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::{inline_settings, TestFixture};

#[path = "integration/fixtures/mod.rs"]
mod fixtures;
use fixtures::*;

/// Saved settings load back unchanged, creating the config directory on save
#[tokio::test]
async fn test_settings_save_and_reload() {
    let fixture = TestFixture::new();
    let path = fixture.settings_path();

    let mut settings = Settings {
        convert_to_unicode: false,
        debounce_ms: 40,
        execution: ExecutionMode::Inline,
        ignored_containers: vec!["kbd".to_string()],
        ..Settings::default()
    };
    settings.set_site_rule("Forum.Example", SiteRule::Block);
    settings.save(&path).await.expect("settings saved");

    let loaded = Settings::load(&path).await;
    assert_eq!(loaded, settings);
    assert_eq!(loaded.site_rule_for("forum.example"), SiteRule::Block);
}

/// Field names on disk are camelCase and enums lowercase
#[tokio::test]
async fn test_settings_wire_names() {
    let fixture = TestFixture::new();
    let path = fixture.create_text_file(
        "config/settings.json",
        r#"{"version":"1","convertToUnicode":false,"execution":"inline","perSite":{"a.example":"allow"},"debounceMs":5}"#,
    );

    let settings = Settings::load(&path).await;
    assert!(!settings.convert_to_unicode);
    assert_eq!(settings.execution, ExecutionMode::Inline);
    assert_eq!(settings.site_rule_for("a.example"), SiteRule::Allow);
    assert_eq!(settings.debounce_ms, 5);
}

/// A blocked host never gets a pipeline; other hosts do
#[test]
fn test_site_block_stops_bootstrap() {
    let (doc, _) = Document::from_lines(&["\u{1064}"]);
    let mut settings = inline_settings();
    settings.set_site_rule("blocked.example", SiteRule::Block);

    assert!(Pipeline::bootstrap(&settings, &doc, &[doc.root()], Some("blocked.example")).is_none());
    let pipeline = Pipeline::bootstrap(&settings, &doc, &[doc.root()], Some("open.example")).expect("pipeline starts");
    assert_eq!(pipeline.host(), Some("open.example"));
}

/// A configured model file is picked up; a broken one degrades to heuristic detection
#[tokio::test(start_paused = true)]
async fn test_model_path_selects_detector() {
    let fixture = TestFixture::new();
    let model_path = fixture.root_path.join("models").join("zawgyi.json");
    TrainedModel::train(ZAWGYI_CORPUS.iter(), UNICODE_CORPUS.iter())
        .expect("training succeeds")
        .save(&model_path)
        .expect("model saved");

    let (mut doc, texts) = Document::from_lines(&["\u{1090}"]);
    let root = doc.root();
    let settings = Settings {
        model_path: Some(model_path),
        ..inline_settings()
    };
    let mut pipeline = Pipeline::bootstrap(&settings, &doc, &[root], None).expect("pipeline starts");
    assert_eq!(pipeline.context().service().detector().model_name(), "markov");
    pipeline.settle(&mut doc).await;
    assert_eq!(doc.text(texts[0]), Some("\u{101B}"));

    let broken_path = fixture.create_text_file("models/broken.json", "{}");
    let broken = Settings {
        model_path: Some(broken_path),
        ..inline_settings()
    };
    let pipeline = Pipeline::bootstrap(&broken, &doc, &[root], None).expect("pipeline starts");
    assert_eq!(pipeline.context().service().detector().model_name(), "heuristic");
}

use deck_to_pdf::config::Config;
use deck_to_pdf::logger;
use deck_to_pdf::{discover_decks, run_diagnostic, App, DeckError};
use std::fs;
use std::path::Path;

const SAMPLE_DECK: &str = r#"<!doctype html>
<html>
<head><title>sample</title></head>
<body>
  <div class="reveal">
    <div class="slides">
      <section><h1>第一页</h1></section>
      <section><h1>第二页</h1></section>
    </div>
    <div class="progress"></div>
    <div class="controls"></div>
  </div>
  <script>window.Reveal = { VERSION: "test" };</script>
</body>
</html>
"#;

/// 在 `root/lectures` 下创建幻灯片，`None` 表示不写入口文件
fn make_lectures(root: &Path, decks: &[(&str, Option<&str>)]) {
    for (name, html) in decks {
        let dir = root.join("lectures").join(name);
        fs::create_dir_all(&dir).unwrap();
        if let Some(html) = html {
            fs::write(dir.join("index.html"), html).unwrap();
        }
    }
}

fn config_for(root: &Path) -> Config {
    Config {
        input_root: root.join("lectures"),
        output_dir: root.join("pdfs"),
        ..Config::from_env()
    }
}

#[test]
fn test_discover_decks_sorted() {
    let tmp = tempfile::tempdir().unwrap();
    make_lectures(
        tmp.path(),
        &[("lecture-02", Some("")), ("lecture-01", Some("")), ("lecture-03", None)],
    );

    let names = tokio_test::block_on(discover_decks(&tmp.path().join("lectures"))).unwrap();
    assert_eq!(names, vec!["lecture-01", "lecture-02", "lecture-03"]);
}

#[tokio::test]
async fn test_missing_root_aborts_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let app = App::initialize(config_for(tmp.path())).unwrap();

    let err = app.run().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DeckError>(),
        Some(DeckError::MissingRoot { .. })
    ));
    assert!(!tmp.path().join("pdfs").exists());
}

#[tokio::test]
#[ignore] // 需要本机安装 Chrome / Chromium：cargo test -- --ignored
async fn test_batch_renders_pdfs() {
    logger::init();

    let tmp = tempfile::tempdir().unwrap();
    make_lectures(
        tmp.path(),
        &[
            ("lecture-01", Some(SAMPLE_DECK)),
            ("lecture-02", Some(SAMPLE_DECK)),
            ("lecture-03", None),
        ],
    );

    let app = App::initialize(config_for(tmp.path())).expect("初始化失败");
    let report = app.run().await.expect("批量导出失败");

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.skipped, vec!["lecture-03"]);

    for name in ["lecture-01", "lecture-02"] {
        let bytes = fs::read(tmp.path().join("pdfs").join(format!("{}.pdf", name))).unwrap();
        assert!(bytes.starts_with(b"%PDF-"), "{} 不是 PDF", name);
    }
    assert!(!tmp.path().join("pdfs/lecture-03.pdf").exists());
}

#[tokio::test]
#[ignore]
async fn test_diagnose_detects_framework() {
    logger::init();

    let tmp = tempfile::tempdir().unwrap();
    make_lectures(tmp.path(), &[("lecture-01", Some(SAMPLE_DECK))]);

    let report = run_diagnostic(&config_for(tmp.path()))
        .await
        .expect("诊断失败");

    assert!(report.passed());
    assert_eq!(report.framework_marker, Some(true));
    assert!(tmp.path().join("pdfs/lecture-01.pdf").exists());
}

#[tokio::test]
#[ignore]
async fn test_diagnose_reports_missing_framework_separately() {
    logger::init();

    let tmp = tempfile::tempdir().unwrap();
    make_lectures(
        tmp.path(),
        &[("lecture-01", Some("<html><body><p>plain page</p></body></html>"))],
    );

    let mut config = config_for(tmp.path());
    config.diagnostic.export_pdf = false;

    let report = run_diagnostic(&config).await.expect("诊断失败");

    assert_eq!(report.framework_marker, Some(false));
    assert!(!report.check("framework_marker").unwrap().passed);
    assert!(report.passed(), "框架缺失默认不影响总体结果");
}

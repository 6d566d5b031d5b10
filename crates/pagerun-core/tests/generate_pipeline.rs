//! End-to-end generation pipeline tests over temp directories.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pagerun_core::adjust::PassthroughAdjuster;
use pagerun_core::config::Config;
use pagerun_core::generate::{GenerateOptions, GenerateReport, generate};
use pagerun_core::runtime::PAGE_TEMPLATE;
use pagerun_core::script::ScriptRef;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("pages").join("home")).unwrap();
        Self { _dir: dir, root }
    }

    fn write_page_script(&self, name: &str, content: &str) {
        fs::write(self.root.join("pages").join("home").join(name), content).unwrap();
    }

    fn options(&self, js_list: Vec<ScriptRef>) -> GenerateOptions {
        GenerateOptions {
            entry: self.root.join("pages").join("home").join("index.html"),
            output: self.root.join("out").join("home").join("index.js"),
            common_output: self.root.join("out").join("common").join("js"),
            js_list,
            body: json!({
                "tag": "body",
                "children": [{"tag": "div", "attrs": {"id": "app"}}]
            }),
            entry_key: "home".to_string(),
            compress_js: false,
            proxy: None,
        }
    }

    async fn generate(&self, options: &GenerateOptions) -> GenerateReport {
        generate(options, &PassthroughAdjuster, &Config::default())
            .await
            .unwrap()
    }
}

fn inline(content: &str) -> ScriptRef {
    ScriptRef::Inline {
        content: content.to_string(),
    }
}

fn outer(src: &str) -> ScriptRef {
    ScriptRef::Outer {
        src: src.to_string(),
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn inline_then_outer_scenario() {
    let fixture = Fixture::new();
    fixture.write_page_script("a.js", "this.y=2;");

    let options = fixture.options(vec![inline("var x=1;"), outer("./a.js")]);
    let report = fixture.generate(&options).await;

    let runtime = read(&report.runtime_path);

    // Inline statement precedes the cached-module invocation.
    let inline_pos = runtime.find("/* inline script */\nvar x=1;").unwrap();
    let outer_pos = runtime.find("/* outer script: ./a.js */").unwrap();
    assert!(inline_pos < outer_pos);

    // The outer statement requires the fingerprinted module with (window, document).
    assert_eq!(report.cached_modules.len(), 1);
    let module = &report.cached_modules[0];
    assert_eq!(module.filename, format!("a-{}.js", module.fingerprint));
    assert!(runtime.contains(&format!(
        "require('../../common/js/{}')(window, document);",
        module.filename
    )));

    // The cached module wraps the body so top-level `this` is the window.
    let cached = read(&module.path);
    assert!(cached.starts_with("module.exports=function(window,document){"));
    assert!(cached.contains("var module=undefined;"));
    assert!(cached.contains("var global=window;"));
    assert!(cached.contains("(function(){this.y=2;}).call(window)"));

    // Fixed structure around the interleaved statements.
    assert!(runtime.contains("const pageKey = 'home';"));
    assert!(runtime.contains("const run = function(window, document) {"));
    assert!(runtime.contains("const global = null;"));
    assert!(runtime.ends_with(PAGE_TEMPLATE));
}

#[tokio::test]
async fn repeated_generate_is_byte_identical() {
    let fixture = Fixture::new();
    fixture.write_page_script("a.js", "this.y=2;");

    let options = fixture.options(vec![inline("var x=1;"), outer("./a.js")]);
    let first = fixture.generate(&options).await;
    let runtime_before = read(&first.runtime_path);
    let ast_before = read(&first.ast_path);
    let module_before = read(&first.cached_modules[0].path);

    let second = fixture.generate(&options).await;

    assert_eq!(runtime_before, read(&second.runtime_path));
    assert_eq!(ast_before, read(&second.ast_path));
    assert_eq!(module_before, read(&second.cached_modules[0].path));
}

#[tokio::test]
async fn identical_outer_scripts_share_one_cache_file() {
    let fixture = Fixture::new();
    fixture.write_page_script("a.js", "this.y=2;");

    let options = fixture.options(vec![outer("./a.js"), outer("./a.js")]);
    let report = fixture.generate(&options).await;

    assert_eq!(report.cached_modules.len(), 2);
    assert_eq!(
        report.cached_modules[0].path,
        report.cached_modules[1].path
    );

    let cache_entries: Vec<_> = fs::read_dir(&options.common_output)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(cache_entries.len(), 1);
}

#[tokio::test]
async fn distinct_contents_get_distinct_cache_files() {
    let fixture = Fixture::new();
    fixture.write_page_script("a.js", "this.y=2;");
    fixture.write_page_script("b.js", "this.z=3;");

    let options = fixture.options(vec![outer("./a.js"), outer("./b.js")]);
    let report = fixture.generate(&options).await;

    assert_eq!(report.cached_modules.len(), 2);
    assert_ne!(
        report.cached_modules[0].fingerprint,
        report.cached_modules[1].fingerprint
    );

    let cache_entries: Vec<_> = fs::read_dir(&options.common_output).unwrap().collect();
    assert_eq!(cache_entries.len(), 2);
}

#[tokio::test]
async fn skipped_reference_does_not_break_siblings() {
    let fixture = Fixture::new();
    fixture.write_page_script("b.js", "var after=1;");

    let options = fixture.options(vec![
        inline("var before=1;"),
        outer("./gone.js"),
        outer("./b.js"),
    ]);
    let report = fixture.generate(&options).await;

    assert_eq!(report.skipped, vec!["./gone.js".to_string()]);
    assert_eq!(report.cached_modules.len(), 1);

    let runtime = read(&report.runtime_path);
    assert!(!runtime.contains("gone.js"));
    let before_pos = runtime.find("var before=1;").unwrap();
    let after_pos = runtime.find("/* outer script: ./b.js */").unwrap();
    assert!(before_pos < after_pos);
}

#[tokio::test]
async fn ast_file_round_trips_and_honors_compression() {
    let fixture = Fixture::new();

    // Pretty mode: configured indent, exact round-trip.
    let options = fixture.options(vec![]);
    let report = fixture.generate(&options).await;
    let pretty = read(&report.ast_path);
    assert!(pretty.starts_with("module.exports = {"));
    assert!(pretty.ends_with(";"));
    assert!(pretty.contains("\n  \"tag\""));

    let json_text = pretty
        .strip_prefix("module.exports = ")
        .unwrap()
        .strip_suffix(';')
        .unwrap();
    let reparsed: Value = serde_json::from_str(json_text).unwrap();
    assert_eq!(reparsed, options.body);

    // Compact mode: no whitespace between tokens.
    let mut compressed = fixture.options(vec![]);
    compressed.compress_js = true;
    let report = fixture.generate(&compressed).await;
    let compact = read(&report.ast_path);
    assert!(!compact.contains('\n'));
    assert!(!compact.contains(": "));

    let json_text = compact
        .strip_prefix("module.exports = ")
        .unwrap()
        .strip_suffix(';')
        .unwrap();
    let reparsed: Value = serde_json::from_str(json_text).unwrap();
    assert_eq!(reparsed, compressed.body);
}

#[tokio::test]
async fn remote_script_is_fetched_and_cached() {
    let fixture = Fixture::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/lib.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this.remote=1;"))
        .expect(1)
        .mount(&server)
        .await;

    let src = format!("{}/static/lib.js", server.uri());
    let options = fixture.options(vec![outer(&src)]);
    let report = fixture.generate(&options).await;

    assert!(report.skipped.is_empty());
    assert_eq!(report.cached_modules.len(), 1);
    let module = &report.cached_modules[0];
    assert!(module.filename.starts_with("lib-"));

    let cached = read(&module.path);
    assert!(cached.contains("(function(){this.remote=1;}).call(window)"));

    let runtime = read(&report.runtime_path);
    assert!(runtime.contains(&format!("/* outer script: {src} */")));
    assert!(runtime.contains(&format!(
        "require('../../common/js/{}')(window, document);",
        module.filename
    )));
}

#[tokio::test]
async fn remote_404_is_skipped_in_lenient_mode() {
    // No mounted mock: the server answers every request with 404.
    let fixture = Fixture::new();
    let server = MockServer::start().await;

    let src = format!("{}/gone.js", server.uri());
    let options = fixture.options(vec![outer(&src), inline("var after=1;")]);
    let report = fixture.generate(&options).await;

    assert_eq!(report.skipped, vec![src]);
    assert!(report.cached_modules.is_empty());

    let runtime = read(&report.runtime_path);
    assert!(!runtime.contains("gone.js"));
    assert!(runtime.contains("var after=1;"));
}

#[tokio::test]
async fn remote_404_fails_in_strict_mode() {
    let fixture = Fixture::new();
    let server = MockServer::start().await;

    let src = format!("{}/gone.js", server.uri());
    let options = fixture.options(vec![outer(&src)]);
    let config = Config {
        strict_outer: true,
        ..Config::default()
    };

    let err = generate(&options, &PassthroughAdjuster, &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("gone.js"));
    assert!(!options.output.exists());
}

#[tokio::test]
async fn unreachable_remote_host_is_skipped_in_lenient_mode() {
    let fixture = Fixture::new();

    // Grab a local URL, then shut the server down before generating.
    let server = MockServer::start().await;
    let src = format!("{}/lib.js", server.uri());
    drop(server);

    let options = fixture.options(vec![outer(&src), inline("var after=1;")]);
    let report = fixture.generate(&options).await;

    assert_eq!(report.skipped, vec![src]);
    assert!(report.cached_modules.is_empty());
    assert!(read(&report.runtime_path).contains("var after=1;"));
}

#[tokio::test]
async fn absolute_path_reference_is_fetched() {
    let fixture = Fixture::new();
    let shared = fixture.root.join("shared.js");
    fs::write(&shared, "var shared=1;").unwrap();

    let options = fixture.options(vec![outer(shared.to_str().unwrap())]);
    let report = fixture.generate(&options).await;

    assert_eq!(report.cached_modules.len(), 1);
    assert!(report.cached_modules[0].filename.starts_with("shared-"));
}

//! End-to-end runs against the scripted provider: the full dialog flow, the
//! degraded paths, and placeholder substitution as it reaches the editor.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pq_smoke::providers::{ScriptedNode, ScriptedProvider};
use pq_smoke::{QueryRunner, QueryScript, RetryPolicy, RunConfig, CONFIG_PATH_TOKEN};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn button(name: &str) -> ScriptedNode {
    ScriptedNode::named("button", name)
}

/// The dialog flow of a healthy application: startup dialog, data source
/// gallery, query editor with the formula dialog, privacy prompts and a
/// populated results grid.
fn full_desktop() -> ScriptedNode {
    ScriptedNode::new("desktop")
        .with_child(main_window())
        .with_child(query_editor())
}

fn main_window() -> ScriptedNode {
    ScriptedNode::named("window", "PBIDesktop")
        .with_child(
            ScriptedNode::new("dialog")
                .with_id("KoStartDialog")
                .with_child(button("Get data")),
        )
        .with_child(source_gallery())
}

fn source_gallery() -> ScriptedNode {
    ScriptedNode::new("dialog")
        .with_id("DataSourceGalleryDialog")
        .with_child(ScriptedNode::named("edit", "Search"))
        .with_child(ScriptedNode::named("listitem", "Blank Query"))
        .with_child(button("Connect"))
}

fn query_editor() -> ScriptedNode {
    ScriptedNode::new("window")
        .with_id("QueriesEditorWindow")
        .with_child(button("Advanced Editor"))
        .with_child(formula_dialog())
        .with_child(button("Invoke"))
        .with_child(button("Continue"))
        .with_child(
            ScriptedNode::new("dialog")
                .with_id("FirewallDialog")
                .with_child(ScriptedNode::new("checkbox"))
                .with_child(button("Save")),
        )
        .with_child(ScriptedNode::new("datagrid"))
}

fn formula_dialog() -> ScriptedNode {
    ScriptedNode::new("dialog")
        .with_id("ViewFormulaDialog")
        .with_child(ScriptedNode::new("edit"))
        .with_child(button("Done"))
}

fn runner(provider: &Arc<ScriptedProvider>) -> QueryRunner {
    QueryRunner::new(provider.clone()).with_retry_policy(RetryPolicy::immediate())
}

fn write_script(dir: &tempfile::TempDir, name: &str, text: &str) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path)?;
    file.write_all(text.as_bytes())?;
    Ok(path)
}

#[tokio::test]
async fn blank_query_script_runs_end_to_end() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(&dir, "GetDataView.pq", "let Source = 1 in Source")?;

    let provider = Arc::new(ScriptedProvider::new(full_desktop()));
    assert!(runner(&provider).verify_script_file(&script).await);

    assert_eq!(
        provider.actions(),
        vec![
            "invoke:Get data",
            "set_text:Search=Blank Query",
            "click:Blank Query",
            "invoke:Connect",
            "invoke:Advanced Editor",
            "set_text:edit=let Source = 1 in Source",
            "invoke:Done",
            "invoke:Invoke",
            "invoke:Continue",
            "toggle:checkbox",
            "invoke:Save",
        ]
    );
    assert_eq!(provider.close_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_advanced_editor_fails_but_still_closes() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(&dir, "GetDataView.pq", "let Source = 1 in Source")?;

    // Same flow, but the formula dialog never opens.
    let desktop = ScriptedNode::new("desktop")
        .with_child(main_window())
        .with_child(
            ScriptedNode::new("window")
                .with_id("QueriesEditorWindow")
                .with_child(button("Advanced Editor"))
                .with_child(ScriptedNode::new("datagrid")),
        );

    let provider = Arc::new(ScriptedProvider::new(desktop));
    let report = runner(&provider).run_script_file(&script).await;

    assert!(!report.passed);
    assert_eq!(report.failed_step.as_deref(), Some("advanced editor dialog"));
    assert!(report.failure.unwrap().contains("advanced editor dialog"));
    assert_eq!(provider.close_calls(), 1, "teardown must survive the failure");
    Ok(())
}

#[tokio::test]
async fn config_placeholder_reaches_the_editor_resolved() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(
        &dir,
        "GetAsset.pq",
        &format!(
            "let Config = Json.Document(File.Contents(\"{CONFIG_PATH_TOKEN}\")), \
             Again = \"{CONFIG_PATH_TOKEN}\" in Config"
        ),
    )?;

    let provider = Arc::new(ScriptedProvider::new(full_desktop()));
    assert!(runner(&provider).verify_script_file(&script).await);

    let resolved = std::env::current_dir()?
        .join("appsettings.json")
        .to_string_lossy()
        .into_owned();
    let typed = provider
        .actions()
        .into_iter()
        .find(|entry| entry.starts_with("set_text:edit="))
        .expect("the script must reach the editor");
    assert_eq!(typed.matches(&resolved).count(), 2);
    assert!(!typed.contains(CONFIG_PATH_TOKEN));
    Ok(())
}

#[tokio::test]
async fn absent_optional_dialogs_do_not_fail_the_run() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(&dir, "GetDataView.pq", "let Source = 1 in Source")?;

    // No startup dialog, no privacy prompts: every optional step is absent.
    let desktop = ScriptedNode::new("desktop")
        .with_child(ScriptedNode::named("window", "PBIDesktop").with_child(source_gallery()))
        .with_child(
            ScriptedNode::new("window")
                .with_id("QueriesEditorWindow")
                .with_child(button("Advanced Editor"))
                .with_child(formula_dialog())
                .with_child(button("Invoke"))
                .with_child(ScriptedNode::new("datagrid")),
        );

    let provider = Arc::new(ScriptedProvider::new(desktop));
    let report = runner(&provider).run_script_file(&script).await;

    assert!(report.passed, "optional absence alone must never fail a run");
    assert_eq!(
        provider.actions(),
        vec![
            "set_text:Search=Blank Query",
            "click:Blank Query",
            "invoke:Connect",
            "invoke:Advanced Editor",
            "set_text:edit=let Source = 1 in Source",
            "invoke:Done",
            "invoke:Invoke",
        ]
    );
    assert_eq!(provider.close_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn dialogs_appearing_on_later_attempts_are_still_found() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(&dir, "GetDataView.pq", "let Source = 1 in Source")?;

    let desktop = ScriptedNode::new("desktop")
        .with_child(
            ScriptedNode::named("window", "PBIDesktop").with_child(
                ScriptedNode::new("dialog")
                    .with_id("DataSourceGalleryDialog")
                    .appears_after(2)
                    .with_child(ScriptedNode::named("edit", "Search"))
                    .with_child(ScriptedNode::named("listitem", "Blank Query"))
                    .with_child(button("Connect")),
            ),
        )
        .with_child(query_editor());

    let provider = Arc::new(ScriptedProvider::new(desktop));
    let report = runner(&provider).run_script_file(&script).await;

    assert!(report.passed, "{:?}", report.failure);
    Ok(())
}

#[tokio::test]
async fn a_list_item_that_never_enables_fails_the_selection_step() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(&dir, "GetDataView.pq", "let Source = 1 in Source")?;

    let desktop = ScriptedNode::new("desktop")
        .with_child(
            ScriptedNode::named("window", "PBIDesktop").with_child(
                ScriptedNode::new("dialog")
                    .with_id("DataSourceGalleryDialog")
                    .with_child(ScriptedNode::named("edit", "Search"))
                    .with_child(
                        ScriptedNode::named("listitem", "Blank Query").enabled_after(usize::MAX),
                    )
                    .with_child(button("Connect")),
            ),
        )
        .with_child(query_editor());

    let provider = Arc::new(ScriptedProvider::new(desktop));
    let report = runner(&provider).run_script_file(&script).await;

    assert!(!report.passed);
    assert_eq!(report.failed_step.as_deref(), Some("select data source"));
    assert!(report.failure.unwrap().contains("not interactable"));
    assert_eq!(provider.close_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn a_briefly_disabled_list_item_is_awaited() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = write_script(&dir, "GetDataView.pq", "let Source = 1 in Source")?;

    let desktop = ScriptedNode::new("desktop")
        .with_child(
            ScriptedNode::named("window", "PBIDesktop").with_child(
                ScriptedNode::new("dialog")
                    .with_id("DataSourceGalleryDialog")
                    .with_child(ScriptedNode::named("edit", "Search"))
                    .with_child(ScriptedNode::named("listitem", "Blank Query").enabled_after(3))
                    .with_child(button("Connect")),
            ),
        )
        .with_child(query_editor());

    let provider = Arc::new(ScriptedProvider::new(desktop));
    let config = RunConfig {
        item_ready_timeout: Duration::from_millis(200),
        ..RunConfig::default()
    };
    let runner = QueryRunner::new(provider.clone())
        .with_config(config)
        .with_retry_policy(
            RetryPolicy::immediate().with_poll_interval(Duration::from_millis(1)),
        );

    let report = runner.run_script_file(&script).await;

    assert!(report.passed, "{:?}", report.failure);
    assert!(provider.actions().contains(&"click:Blank Query".to_string()));
    Ok(())
}

#[tokio::test]
async fn an_unreadable_script_degrades_to_an_empty_run() {
    init_tracing();

    let provider = Arc::new(ScriptedProvider::new(full_desktop()));
    let report = runner(&provider)
        .run_script_file("/definitely/not/here/GetDataView.pq")
        .await;

    // The lenient read policy still drives the flow; the editor just
    // receives an empty script.
    assert!(report.passed);
    assert!(provider
        .actions()
        .contains(&"set_text:edit=".to_string()));
}

#[tokio::test]
async fn in_memory_scripts_skip_the_filesystem() {
    init_tracing();

    let provider = Arc::new(ScriptedProvider::new(full_desktop()));
    let report = runner(&provider)
        .run_script(QueryScript::new("let Source = 1 in Source"))
        .await;

    assert!(report.passed);
    assert_eq!(report.steps_run, 17);
}

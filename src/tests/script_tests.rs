use std::path::Path;

use crate::script::{resolve_config_path, QueryScript, CONFIG_PATH_TOKEN};

#[test]
fn substitution_replaces_every_occurrence() {
    let script = QueryScript::new(format!(
        "let Config = Json.Document(File.Contents(\"{CONFIG_PATH_TOKEN}\")), \
         Backup = File.Contents(\"{CONFIG_PATH_TOKEN}\") in Config"
    ));

    let substituted = script.with_config_path("C:/work/appsettings.json");

    assert_eq!(substituted.text().matches("C:/work/appsettings.json").count(), 2);
    assert!(!substituted.text().contains(CONFIG_PATH_TOKEN));
}

#[test]
fn substitution_without_the_token_is_a_no_op() {
    let script = QueryScript::new("let Source = 1 in Source");

    let substituted = script.clone().with_config_path("/tmp/appsettings.json");

    assert_eq!(substituted, script);
}

#[test]
fn substitution_is_idempotent() {
    let script = QueryScript::new(format!("let Path = \"{CONFIG_PATH_TOKEN}\" in Path"));

    let once = script.with_config_path("/tmp/appsettings.json");
    let twice = once.clone().with_config_path("/tmp/appsettings.json");

    assert_eq!(once, twice);
}

#[test]
fn missing_script_degrades_to_empty() {
    let script = QueryScript::load(Path::new("/definitely/not/here/GetDataView.pq"));

    assert!(script.is_empty());
}

#[test]
fn relative_config_paths_resolve_against_the_working_directory() {
    let resolved = resolve_config_path(Path::new("appsettings.json"));

    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("appsettings.json"));
}

#[test]
fn absolute_config_paths_pass_through() {
    let absolute = std::env::temp_dir().join("appsettings.json");

    assert_eq!(resolve_config_path(&absolute), absolute);
}

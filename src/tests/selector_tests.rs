use crate::selector::Selector;

#[test]
fn bare_strings_are_accessible_names() {
    assert_eq!(
        Selector::from("Advanced Editor"),
        Selector::Name("Advanced Editor".to_string())
    );
    assert_eq!(Selector::from("Get data"), Selector::Name("Get data".to_string()));
}

#[test]
fn name_prefix_is_explicit() {
    assert_eq!(
        Selector::from("name:Connect"),
        Selector::Name("Connect".to_string())
    );
}

#[test]
fn automation_id_prefixes() {
    assert_eq!(
        Selector::from("id:KoStartDialog"),
        Selector::AutomationId("KoStartDialog".to_string())
    );
    assert_eq!(
        Selector::from("#ViewFormulaDialog"),
        Selector::AutomationId("ViewFormulaDialog".to_string())
    );
}

#[test]
fn control_type_words_resolve_to_roles() {
    assert_eq!(Selector::from("checkbox"), Selector::Role("checkbox".to_string()));
    assert_eq!(Selector::from("datagrid"), Selector::Role("datagrid".to_string()));
    assert_eq!(
        Selector::from("role:edit"),
        Selector::Role("edit".to_string())
    );
}

#[test]
fn empty_selector_strings_are_invalid() {
    assert!(matches!(Selector::from("  "), Selector::Invalid(_)));
}

#[test]
fn role_matching_ignores_case() {
    let selector = Selector::Role("DataGrid".to_string());

    assert!(selector.matches("datagrid", None, None));
    assert!(!selector.matches("edit", None, None));
}

#[test]
fn name_matching_is_exact() {
    let selector = Selector::Name("Connect".to_string());

    assert!(selector.matches("button", Some("Connect"), None));
    assert!(!selector.matches("button", Some("connect"), None));
    assert!(!selector.matches("button", None, Some("Connect")));
}

#[test]
fn invalid_selectors_match_nothing() {
    let selector = Selector::Invalid("empty selector string".to_string());

    assert!(!selector.matches("window", Some("window"), Some("window")));
}

use serde::{Deserialize, Serialize};

/// Represents ways to locate a UI element in the automation tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Select by accessible name/label
    Name(String),
    /// Select by the provider-native automation id
    AutomationId(String),
    /// Select by control type ("button", "edit", "checkbox", "datagrid", ...)
    Role(String),
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl Selector {
    /// Whether an element with the given attributes satisfies this selector.
    ///
    /// Name and automation id comparisons are exact; roles compare
    /// case-insensitively since providers differ on casing.
    pub fn matches(&self, role: &str, name: Option<&str>, automation_id: Option<&str>) -> bool {
        match self {
            Selector::Name(expected) => name == Some(expected.as_str()),
            Selector::AutomationId(expected) => automation_id == Some(expected.as_str()),
            Selector::Role(expected) => role.eq_ignore_ascii_case(expected),
            Selector::Invalid(_) => false,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Selector::Invalid("empty selector string".to_string());
        }

        match s {
            _ if s.starts_with("role:") => Selector::Role(s[5..].trim().to_string()),
            // Common control types resolve to Role selectors instead of Name
            "window" | "button" | "checkbox" | "edit" | "textfield" | "listitem" | "datagrid"
            | "menu" | "menuitem" => Selector::Role(s.to_string()),
            _ if s.to_lowercase().starts_with("id:") => {
                Selector::AutomationId(s[3..].trim().to_string())
            }
            _ if s.starts_with('#') => Selector::AutomationId(s[1..].to_string()),
            _ if s.to_lowercase().starts_with("name:") => {
                Selector::Name(s[5..].trim().to_string())
            }
            // Dialog captions and button labels dominate this workflow, so a
            // bare string is an accessible name.
            _ => Selector::Name(s.to_string()),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}

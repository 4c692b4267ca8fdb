use crate::errors::AutomationError;
use crate::selector::Selector;
use std::fmt::Debug;

/// Interface for provider-specific element implementations
///
/// The automation tree mutates as dialogs open and close, so implementations
/// make no identity guarantees across lookups; callers re-query instead of
/// holding handles long-term.
pub trait UIElementImpl: Send + Sync + Debug {
    fn role(&self) -> String;
    fn name(&self) -> Option<String>;
    fn automation_id(&self) -> Option<String>;
    fn parent(&self) -> Result<Option<UIElement>, AutomationError>;
    /// Direct children matching `selector`, in tree order.
    fn find_children(&self, selector: &Selector) -> Result<Vec<UIElement>, AutomationError>;
    /// All matching descendants, depth-first.
    fn find_descendants(&self, selector: &Selector) -> Result<Vec<UIElement>, AutomationError>;
    fn invoke(&self) -> Result<(), AutomationError>;
    fn click(&self) -> Result<(), AutomationError>;
    fn set_text(&self, text: &str) -> Result<(), AutomationError>;
    fn toggle(&self) -> Result<(), AutomationError>;
    fn is_enabled(&self) -> Result<bool, AutomationError>;

    // Add a method to clone the box
    fn clone_box(&self) -> Box<dyn UIElementImpl>;
}

/// Represents a UI element in a desktop application
#[derive(Debug)]
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

impl UIElement {
    pub fn new(inner: Box<dyn UIElementImpl>) -> Self {
        Self { inner }
    }

    pub fn role(&self) -> String {
        self.inner.role()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    pub fn automation_id(&self) -> Option<String> {
        self.inner.automation_id()
    }

    pub fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        self.inner.parent()
    }

    /// First direct child matching `selector`.
    ///
    /// An empty match collection is absence: only a concrete first match
    /// counts as found.
    pub fn find_child(&self, selector: &Selector) -> Result<Option<UIElement>, AutomationError> {
        Ok(self.inner.find_children(selector)?.into_iter().next())
    }

    /// First matching descendant, searched depth-first.
    pub fn find_descendant(
        &self,
        selector: &Selector,
    ) -> Result<Option<UIElement>, AutomationError> {
        Ok(self.inner.find_descendants(selector)?.into_iter().next())
    }

    pub fn find_descendants(
        &self,
        selector: &Selector,
    ) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.find_descendants(selector)
    }

    pub fn invoke(&self) -> Result<(), AutomationError> {
        self.inner.invoke()
    }

    pub fn click(&self) -> Result<(), AutomationError> {
        self.inner.click()
    }

    pub fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.set_text(text)
    }

    pub fn toggle(&self) -> Result<(), AutomationError> {
        self.inner.toggle()
    }

    pub fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.inner.is_enabled()
    }

    /// Get a display label for this element, for logging
    pub fn display_name(&self) -> String {
        self.name()
            .or_else(|| self.automation_id())
            .unwrap_or_else(|| self.role())
    }
}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

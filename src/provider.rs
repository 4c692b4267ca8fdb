use crate::element::UIElement;
use crate::errors::AutomationError;
use std::fmt::Debug;

/// The common trait all automation-tree providers must implement
///
/// A provider owns the accessibility tree and the application process
/// lifecycle; everything above it drives elements through [`UIElement`]
/// handles and never touches the platform APIs directly.
#[async_trait::async_trait]
pub trait AutomationProvider: Send + Sync {
    /// Launch the application and return once its main window handle exists.
    async fn launch(&self, application_path: &str) -> Result<Application, AutomationError>;
}

/// Interface for provider-specific application handles
pub trait ApplicationImpl: Send + Sync + Debug {
    fn main_window(&self) -> Result<UIElement, AutomationError>;

    /// The top-level container holding the main window, used to reach
    /// sibling windows the application spawns.
    fn desktop_root(&self) -> Result<UIElement, AutomationError> {
        let window = self.main_window()?;
        window.parent()?.ok_or_else(|| {
            AutomationError::ApplicationError("main window has no parent container".to_string())
        })
    }

    /// Close the application process.
    fn close(&self) -> Result<(), AutomationError>;
}

/// A launched application instance, exclusively driven by one run
#[derive(Debug)]
pub struct Application {
    inner: Box<dyn ApplicationImpl>,
}

impl Application {
    pub fn new(inner: Box<dyn ApplicationImpl>) -> Self {
        Self { inner }
    }

    pub fn main_window(&self) -> Result<UIElement, AutomationError> {
        self.inner.main_window()
    }

    pub fn desktop_root(&self) -> Result<UIElement, AutomationError> {
        self.inner.desktop_root()
    }

    pub fn close(&self) -> Result<(), AutomationError> {
        self.inner.close()
    }
}

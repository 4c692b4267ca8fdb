use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Element is not enabled: {0}")]
    ElementNotEnabled(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Application error: {0}")]
    ApplicationError(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),
}

use std::time::Duration;

/// Failures raised by an automation backend.
///
/// None of these reach the caller of a search: the scrapers decide locally
/// whether an error means "no results", "stop paginating" or "abort".
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Element `{selector}` not found within {timeout:?}")]
    NotFound { selector: String, timeout: Duration },

    #[error("{action} timed out after {timeout:?}")]
    Timeout { action: String, timeout: Duration },

    #[error("In-page evaluation failed: {0}")]
    Evaluate(String),

    #[error("Browser session is closed")]
    Closed,

    #[error("Automation backend error: {0}")]
    Backend(String),
}

impl AutomationError {
    /// Timeouts and missing elements are decision points, not faults.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AutomationError::NotFound { .. } | AutomationError::Timeout { .. }
        )
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;

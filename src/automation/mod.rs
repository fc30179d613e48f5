//! Browser automation capability.
//!
//! Scrapers only talk to these traits. A backend adapter (currently
//! [`chrome::ChromeBackend`]) is picked once, when the scraper is built.

pub mod chrome;

use crate::error::AutomationResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub use chrome::ChromeBackend;

/// When a navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    /// Load event plus a quiet period without new network requests
    #[default]
    NetworkIdle,
}

/// Settings applied to every browser a backend launches
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    /// Upper bound for a single page action (navigation, click, evaluation)
    pub action_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            action_timeout: Duration::from_secs(30),
        }
    }
}

/// Factory for browser sessions. Creating a session is cheap; the browser
/// process is only launched on [`AutomationSession::init`].
pub trait AutomationBackend: Send + Sync + 'static {
    type Session: AutomationSession;

    fn session(&self, options: SessionOptions) -> Self::Session;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// One browser process
#[async_trait]
pub trait AutomationSession: Send {
    type Page: AutomationPage;

    /// Launch the browser unless it is already running.
    async fn init(&mut self) -> AutomationResult<()>;

    /// Open a new page, launching the browser first if needed.
    async fn new_page(&mut self) -> AutomationResult<Self::Page>;

    /// Terminate the browser. Calling it again is a no-op.
    async fn close(&mut self) -> AutomationResult<()>;
}

/// One open page (tab) of a session
#[async_trait]
pub trait AutomationPage: Send + Sync {
    async fn goto(&self, url: &str, wait_until: WaitUntil) -> AutomationResult<()>;

    /// Fails with [`crate::error::AutomationError::NotFound`] when nothing
    /// matches `selector` before `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> AutomationResult<()>;

    async fn wait_for_navigation(&self, wait_until: WaitUntil) -> AutomationResult<()>;

    async fn click(&self, selector: &str) -> AutomationResult<()>;

    async fn type_text(&self, selector: &str, text: &str) -> AutomationResult<()>;

    async fn press_key(&self, key: &str) -> AutomationResult<()>;

    /// Run `function` (JavaScript function source) inside the page with
    /// `args` and return its JSON-serializable result.
    async fn evaluate(&self, function: &str, args: &[Value]) -> AutomationResult<Value>;

    /// Outer HTML of the current document
    async fn content(&self) -> AutomationResult<String>;

    async fn close(&self) -> AutomationResult<()>;
}

/// Build the expression that calls `function` with `args` in the page and
/// hands the result back as a JSON string.
///
/// The function must be self-contained: it is shipped as source text and
/// cannot see anything from this process except its arguments.
pub fn invocation_expression(function: &str, args: &[Value]) -> String {
    let args = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!("(async () => JSON.stringify(await ({function})({args})))()")
}

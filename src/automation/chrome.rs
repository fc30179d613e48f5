use super::{
    invocation_expression, AutomationBackend, AutomationPage, AutomationSession, SessionOptions,
    WaitUntil,
};
use crate::error::{AutomationError, AutomationResult};
use async_trait::async_trait;
use headless_chrome::util::Timeout as WaitTimeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest quiet-network wait after the load event
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves once the page's resource count has been stable for a second.
/// Reports `{ ok, waitedMs, resourceCount }`.
const NETWORK_IDLE_SCRIPT: &str = r#"
async (timeoutMs) => {
    const idleMs = 1000;
    const interval = 250;
    const count = () => {
        try { return performance.getEntriesByType('resource').length; } catch (_) { return 0; }
    };
    const start = Date.now();
    let last = count();
    let stable = 0;
    while (Date.now() - start < timeoutMs) {
        await new Promise((r) => setTimeout(r, interval));
        const current = count();
        if (document.readyState === 'complete' && current === last) {
            stable += interval;
            if (stable >= idleMs) {
                return { ok: true, waitedMs: Date.now() - start, resourceCount: current };
            }
        } else {
            stable = 0;
        }
        last = current;
    }
    return { ok: false, waitedMs: Date.now() - start, resourceCount: last };
}
"#;

/// Headless Chrome via the DevTools protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeBackend;

impl AutomationBackend for ChromeBackend {
    type Session = ChromeSession;

    fn session(&self, options: SessionOptions) -> ChromeSession {
        ChromeSession {
            options,
            browser: None,
        }
    }

    fn name(&self) -> &'static str {
        "headless_chrome"
    }
}

/// Lazily launched Chrome process
pub struct ChromeSession {
    options: SessionOptions,
    browser: Option<Browser>,
}

#[async_trait]
impl AutomationSession for ChromeSession {
    type Page = ChromePage;

    async fn init(&mut self) -> AutomationResult<()> {
        if self.browser.is_some() {
            return Ok(());
        }

        let headless = self.options.headless;
        info!(headless, "Launching headless Chrome...");

        let browser = tokio::task::spawn_blocking(move || {
            let options = LaunchOptions::default_builder()
                .headless(headless)
                .build()
                .map_err(|e| AutomationError::Launch(format!("invalid launch options: {e}")))?;

            Browser::new(options).map_err(|e| AutomationError::Launch(format!("{e:#}")))
        })
        .await
        .map_err(|e| AutomationError::Launch(format!("launch task failed: {e}")))??;

        self.browser = Some(browser);
        info!("Chrome browser launched");
        Ok(())
    }

    async fn new_page(&mut self) -> AutomationResult<ChromePage> {
        self.init().await?;
        let browser = self.browser.clone().ok_or(AutomationError::Closed)?;
        let action_timeout = self.options.action_timeout;

        let tab = tokio::task::spawn_blocking(move || {
            let tab = browser.new_tab()?;
            tab.set_default_timeout(action_timeout);
            Ok::<_, anyhow::Error>(tab)
        })
        .await
        .map_err(|e| AutomationError::Backend(format!("new tab task failed: {e}")))?
        .map_err(|e| AutomationError::Backend(format!("Failed to open tab: {e:#}")))?;

        Ok(ChromePage {
            tab,
            action_timeout,
        })
    }

    async fn close(&mut self) -> AutomationResult<()> {
        if let Some(browser) = self.browser.take() {
            // Dropping the last handle kills the Chrome process
            tokio::task::spawn_blocking(move || drop(browser))
                .await
                .map_err(|e| AutomationError::Backend(format!("close task failed: {e}")))?;
            info!("Chrome browser closed");
        }
        Ok(())
    }
}

/// Only a wait that ran out of time means the element is missing; any
/// other failure belongs to the session and is passed through.
fn element_wait_outcome(
    found: AutomationResult<bool>,
    selector: &str,
    timeout: Duration,
) -> AutomationResult<()> {
    match found {
        Ok(true) => Ok(()),
        Ok(false) | Err(AutomationError::Timeout { .. }) => Err(AutomationError::NotFound {
            selector: selector.to_string(),
            timeout,
        }),
        Err(e) => Err(e),
    }
}

/// One Chrome tab
pub struct ChromePage {
    tab: Arc<Tab>,
    action_timeout: Duration,
}

impl ChromePage {
    /// Run a blocking tab call on the blocking pool, bounded by `timeout`.
    async fn run<T, F>(&self, action: &str, timeout: Duration, f: F) -> AutomationResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        let task = tokio::task::spawn_blocking(move || f(&tab));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => {
                result.map_err(|e| AutomationError::Backend(format!("{action} failed: {e:#}")))
            }
            Ok(Err(e)) => Err(AutomationError::Backend(format!("{action} task failed: {e}"))),
            Err(_) => Err(AutomationError::Timeout {
                action: action.to_string(),
                timeout,
            }),
        }
    }

    async fn settle(&self, wait_until: WaitUntil) -> AutomationResult<()> {
        // The protocol only tells us about the load event; the network-idle
        // wait is measured from inside the page.
        if wait_until != WaitUntil::NetworkIdle {
            return Ok(());
        }

        let timeout_ms = NETWORK_IDLE_TIMEOUT.as_millis() as u64;
        match self.evaluate(NETWORK_IDLE_SCRIPT, &[Value::from(timeout_ms)]).await {
            Ok(report) => {
                let ok = report.get("ok").and_then(Value::as_bool).unwrap_or(false);
                let waited = report.get("waitedMs").and_then(Value::as_u64).unwrap_or(0);
                debug!(ok, waited_ms = waited, "Network idle wait finished");
            }
            Err(e) => warn!("Network idle wait failed: {e}"),
        }
        Ok(())
    }
}

#[async_trait]
impl AutomationPage for ChromePage {
    async fn goto(&self, url: &str, wait_until: WaitUntil) -> AutomationResult<()> {
        debug!(url, "Navigating");
        let target = url.to_string();
        self.run("navigation", self.action_timeout, move |tab| {
            tab.navigate_to(&target)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await?;

        self.settle(wait_until).await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> AutomationResult<()> {
        let target = selector.to_string();
        // Give the blocking call room to report its own timeout first
        let bound = timeout + Duration::from_secs(1);

        let found = self
            .run("wait for selector", bound, move |tab| {
                match tab.wait_for_element_with_custom_timeout(&target, timeout) {
                    Ok(_) => Ok(true),
                    Err(e) if e.downcast_ref::<WaitTimeout>().is_some() => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await;

        element_wait_outcome(found, selector, timeout)
    }

    async fn wait_for_navigation(&self, wait_until: WaitUntil) -> AutomationResult<()> {
        self.run("wait for navigation", self.action_timeout, |tab| {
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await?;

        self.settle(wait_until).await
    }

    async fn click(&self, selector: &str) -> AutomationResult<()> {
        let target = selector.to_string();
        self.run("click", self.action_timeout, move |tab| {
            tab.find_element(&target)?.click()?;
            Ok(())
        })
        .await
    }

    async fn type_text(&self, selector: &str, text: &str) -> AutomationResult<()> {
        let target = selector.to_string();
        let text = text.to_string();
        self.run("type", self.action_timeout, move |tab| {
            tab.find_element(&target)?.type_into(&text)?;
            Ok(())
        })
        .await
    }

    async fn press_key(&self, key: &str) -> AutomationResult<()> {
        let key = key.to_string();
        self.run("key press", self.action_timeout, move |tab| {
            tab.press_key(&key)?;
            Ok(())
        })
        .await
    }

    async fn evaluate(&self, function: &str, args: &[Value]) -> AutomationResult<Value> {
        let expression = invocation_expression(function, args);

        let remote = self
            .run("evaluate", self.action_timeout, move |tab| {
                Ok(tab.evaluate(&expression, true)?)
            })
            .await
            .map_err(|e| AutomationError::Evaluate(e.to_string()))?;

        // `JSON.stringify(undefined)` comes back without a value
        match remote.value {
            Some(Value::String(json)) => serde_json::from_str(&json)
                .map_err(|e| AutomationError::Evaluate(format!("invalid JSON from page: {e}"))),
            Some(other) => Ok(other),
            None => Ok(Value::Null),
        }
    }

    async fn content(&self) -> AutomationResult<String> {
        self.run("read content", self.action_timeout, |tab| tab.get_content())
            .await
    }

    async fn close(&self) -> AutomationResult<()> {
        self.run("close tab", self.action_timeout, |tab| {
            tab.close(false)?;
            Ok(())
        })
        .await
    }
}

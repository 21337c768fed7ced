//! Headless Chromium renderer via the DevTools protocol.
//!
//! The browser is launched on the first screenshot and reused for the rest of
//! the run. Each capture opens a blank tab, navigates it, takes a full-page
//! PNG, and closes the tab. Navigation and capture are bounded by the render
//! timeout; the tab is closed on every path.

use super::Renderer;
use crate::error::RenderError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

pub struct ChromiumRenderer {
    timeout: Duration,
    user_agent: String,
    executable: Option<PathBuf>,
    launched: Mutex<Option<LaunchedBrowser>>,
}

impl ChromiumRenderer {
    /// `CHROMIUM_PATH` overrides executable discovery.
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
            executable: std::env::var("CHROMIUM_PATH")
                .ok()
                .map(PathBuf::from)
                .filter(|p| p.exists()),
            launched: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<LaunchedBrowser, RenderError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.timeout)
            .window_size(1920, 1080)
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .arg("--no-first-run");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        if in_container() {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("browser handler event error: {e}");
                }
            }
        });

        info!("headless browser launched");
        Ok(LaunchedBrowser { browser, handler })
    }

    async fn capture(&self, browser: &Browser, url: &str) -> Result<Vec<u8>, RenderError> {
        let secs = self.timeout.as_secs();
        let page = tokio::time::timeout(self.timeout, browser.new_page("about:blank"))
            .await
            .map_err(|_| RenderError::Timeout(secs))?
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        let shot = async {
            page.goto(url)
                .await
                .map_err(|e| RenderError::Capture(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Capture(e.to_string()))?;
            page.screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))
        };

        let tab = page.clone();
        bounded(self.timeout, shot, async move {
            if let Err(e) = tab.close().await {
                debug!("failed to close tab: {e}");
            }
        })
        .await
    }
}

/// Runs `work` under `limit`, then `cleanup` whether it finished or timed out.
async fn bounded<T>(
    limit: Duration,
    work: impl Future<Output = Result<T, RenderError>>,
    cleanup: impl Future<Output = ()>,
) -> Result<T, RenderError> {
    let outcome = tokio::time::timeout(limit, work).await;
    cleanup.await;
    outcome.unwrap_or(Err(RenderError::Timeout(limit.as_secs())))
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn screenshot(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        let mut slot = self.launched.lock().await;
        if slot.is_none() {
            *slot = Some(self.launch().await?);
        }
        let Some(launched) = slot.as_ref() else {
            return Err(RenderError::Launch("browser unavailable".into()));
        };

        match self.capture(&launched.browser, url).await {
            Ok(png) => {
                debug!(url, bytes = png.len(), "screenshot captured");
                Ok(png)
            }
            Err(RenderError::Timeout(secs)) => {
                warn!(url, "screenshot timed out after {secs}s");
                Err(RenderError::Timeout(secs))
            }
            Err(e) => Err(e),
        }
    }

    async fn shutdown(&self) {
        let Some(mut launched) = self.launched.lock().await.take() else {
            return;
        };
        if let Err(e) = launched.browser.close().await {
            debug!("browser close failed: {e}");
        }
        let _ = launched.browser.wait().await;
        launched.handler.abort();
        info!("headless browser closed");
    }
}

fn in_container() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}

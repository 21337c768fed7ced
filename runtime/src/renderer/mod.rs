//! Page rendering for screenshot evidence.

pub mod chromium;

use crate::error::RenderError;
use async_trait::async_trait;

pub use chromium::ChromiumRenderer;

/// Renders a URL to a full-page PNG.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn screenshot(&self, url: &str) -> Result<Vec<u8>, RenderError>;

    /// Release browser resources. Further screenshots may relaunch.
    async fn shutdown(&self) {}
}

//! Mock QR renderer for testing.

use crate::error::{Result, TicketError};
use crate::providers::QrRenderer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock QR renderer.
///
/// "Renders" a URL as its own UTF-8 bytes so tests can read back what would
/// have been encoded, and records every URL it was given.
#[derive(Debug, Clone, Default)]
pub struct MockQrRenderer {
    rendered: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl MockQrRenderer {
    /// Create a new mock renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent renders fail (or stop failing).
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// URLs rendered so far (for testing).
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl QrRenderer for MockQrRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn render(&self, url: &str) -> Result<Vec<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TicketError::Render("injected render failure".to_string()));
        }

        if let Ok(mut rendered) = self.rendered.lock() {
            rendered.push(url.to_string());
        }
        Ok(url.as_bytes().to_vec())
    }
}

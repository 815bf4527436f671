//! QR renderer trait.

use crate::error::Result;

/// Turns a URL into a scannable image.
///
/// Rendering is a pure function of the URL; implementations hold no state
/// that depends on previous calls.
pub trait QrRenderer: Send + Sync {
    /// MIME type of the produced bytes (e.g., `image/png`).
    fn content_type(&self) -> &'static str;

    /// Encode `url` as an image.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Render`](crate::TicketError::Render) if the URL
    /// does not fit in a QR code or the image cannot be encoded.
    fn render(&self, url: &str) -> Result<Vec<u8>>;
}

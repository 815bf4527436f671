//! PNG QR code renderer.

use crate::error::{Result, TicketError};
use crate::providers::QrRenderer;
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Renders URLs as black-on-white PNG QR codes.
///
/// # Examples
///
/// ```
/// use qrlogin_auth::providers::{PngQrRenderer, QrRenderer};
///
/// let png = PngQrRenderer::new().render("http://localhost:3000/phone?uuid=1").unwrap();
/// assert_eq!(&png[..4], b"\x89PNG");
/// ```
#[derive(Clone, Debug)]
pub struct PngQrRenderer {
    ec_level: EcLevel,
    min_size: u32,
}

impl PngQrRenderer {
    /// Medium error correction, 256 px minimum edge.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ec_level: EcLevel::M,
            min_size: 256,
        }
    }

    /// Set the minimum edge length in pixels.
    #[must_use]
    pub const fn with_min_size(mut self, pixels: u32) -> Self {
        self.min_size = pixels;
        self
    }

    /// Set the error correction level.
    #[must_use]
    pub const fn with_ec_level(mut self, level: EcLevel) -> Self {
        self.ec_level = level;
        self
    }
}

impl Default for PngQrRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl QrRenderer for PngQrRenderer {
    fn content_type(&self) -> &'static str {
        "image/png"
    }

    fn render(&self, url: &str) -> Result<Vec<u8>> {
        let code = QrCode::with_error_correction_level(url.as_bytes(), self.ec_level)
            .map_err(|e| TicketError::Render(e.to_string()))?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| TicketError::Render(e.to_string()))?;

        Ok(png)
    }
}

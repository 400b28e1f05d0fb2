use image::ImageFormat;

use crate::error::ValidationError;

/// MIME type used when the format cannot be named.
const FALLBACK_MIME: &str = "image/jpeg";

/// An image that decoded successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedImage {
    pub format: Option<ImageFormat>,
}

impl ValidatedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MIME)
    }
}

/// Check that `bytes` is non-empty and decodes as a still image.
pub fn validate_image(bytes: &[u8]) -> Result<ValidatedImage, ValidationError> {
    if bytes.is_empty() {
        log::error!("❌ Rejected empty image upload");
        return Err(ValidationError::EmptyImage);
    }

    let format = image::guess_format(bytes).ok();

    if let Err(e) = image::load_from_memory(bytes) {
        log::error!("❌ Invalid image format: {}", e);
        return Err(ValidationError::InvalidImage(e.to_string()));
    }

    log::debug!("🖼️ Image validated: {} bytes, format {:?}", bytes.len(), format);
    Ok(ValidatedImage { format })
}

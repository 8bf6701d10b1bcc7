//! Validation rules shared by the server API and the client-side editor mirror.
//!
//! Both sides enforce the same contract: required text fields are non-empty
//! after trimming, and image payloads are valid base64 decoding to at most
//! [`MAX_IMAGE_BYTES`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

/// Maximum decoded image size (5 MiB pre-encoding).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Prefix added when reconstituting a stored payload into a displayable image.
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// A rejected field value, with a message suitable for a 400 response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Require a non-empty (post-trim) value for a text field.
pub fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Check that an image payload is decodable base64 within the size limit.
///
/// The payload must be raw base64 without a data-URL prefix.
pub fn check_image(payload: &str) -> Result<(), ValidationError> {
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| ValidationError::new(format!("image is not valid base64: {e}")))?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ValidationError::new(format!(
            "image exceeds maximum size of {} bytes (got {})",
            MAX_IMAGE_BYTES,
            bytes.len()
        )));
    }

    Ok(())
}

/// Encode raw image bytes into the base64 payload submitted on create/patch.
///
/// Enforces the pre-encoding size limit so the editor rejects oversized files
/// before they reach the wire.
pub fn encode_image(bytes: &[u8]) -> Result<String, ValidationError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ValidationError::new(format!(
            "image exceeds maximum size of {} bytes (got {})",
            MAX_IMAGE_BYTES,
            bytes.len()
        )));
    }
    Ok(BASE64.encode(bytes))
}

/// Reconstitute a stored base64 payload into a displayable data URL.
pub fn to_data_url(payload: &str) -> String {
    format!("{DATA_URL_PREFIX}{payload}")
}

/// Strip a `data:*;base64,` prefix if present, returning the raw payload.
pub fn strip_data_url(value: &str) -> &str {
    if let Some(rest) = value.strip_prefix("data:") {
        if let Some(idx) = rest.find(";base64,") {
            return &rest[idx + ";base64,".len()..];
        }
    }
    value
}

//! Image encoding: raw bytes → base64 payload for the multimodal request.
//!
//! The vision API accepts images as base64 data embedded in the JSON request
//! body (`inlineData`). Bytes are sent exactly as acquired — no re-encoding or
//! resizing — because a document scan's text crispness matters far more than
//! request size, and the acquisition stage already guaranteed a supported
//! format.

use crate::capture::input::AcquiredImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// A base64 image payload plus its MIME type, ready for the request body.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64-encoded image bytes (standard alphabet, padded).
    pub data: String,
    /// MIME type of the encoded bytes, e.g. `image/jpeg`.
    pub mime_type: String,
}

/// Encode an acquired image for the vision API.
pub fn encode_image(image: &AcquiredImage) -> ImagePayload {
    let data = STANDARD.encode(&image.bytes);
    debug!(
        "Encoded {:?} → {} bytes base64 ({})",
        image.file_name,
        data.len(),
        image.mime_type
    );
    ImagePayload {
        data,
        mime_type: image.mime_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_bytes_as_valid_base64() {
        let img = AcquiredImage {
            bytes: vec![0x89, 0x50, 0x4E, 0x47],
            mime_type: "image/png".into(),
            file_name: "scan.png".into(),
        };
        let payload = encode_image(&img);
        assert_eq!(payload.mime_type, "image/png");
        let decoded = STANDARD.decode(&payload.data).expect("valid base64");
        assert_eq!(decoded, img.bytes);
    }
}

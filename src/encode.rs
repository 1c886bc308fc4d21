//! Raw image bytes → self-describing `data:` URL payload.
//!
//! The page store strips everything up to the first comma and decodes the
//! rest as base64, so the payload must be a standard (padded) base64 body
//! behind a `data:<mime>;base64,` header.

use base64::{engine::general_purpose::STANDARD, Engine as _};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Pick the MIME type: an `image/*` content type from the response wins,
/// then magic-byte sniffing, then a generic binary type.
pub fn mime_type(content_type: Option<&str>, bytes: &[u8]) -> String {
    if let Some(ct) = content_type {
        let essence = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if essence.starts_with("image/") {
            return essence;
        }
    }
    sniff(bytes).unwrap_or(FALLBACK_MIME).to_string()
}

fn sniff(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

/// Encode bytes as `data:<mime>;base64,<body>`
pub fn to_data_url(content_type: Option<&str>, bytes: &[u8]) -> String {
    let mime = mime_type(content_type, bytes);
    let body = STANDARD.encode(bytes);
    log::debug!("Encoded {} bytes as {} ({} chars)", bytes.len(), mime, body.len());
    format!("data:{};base64,{}", mime, body)
}

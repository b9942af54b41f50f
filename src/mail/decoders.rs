use std::collections::HashMap;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::domain::email::{MimePart, RawHeader};

/// base64url that accepts bodies with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a Gmail body `data` field into text.
///
/// Invalid UTF-8 is replaced with U+FFFD; undecodable base64 yields an empty
/// string. Neither is an error.
pub fn decode_body_data(data: &str) -> String {
    match URL_SAFE_LENIENT.decode(data.trim()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("skipping undecodable body data ({} bytes): {e}", data.len());
            String::new()
        }
    }
}

/// First non-empty `text/plain` body in pre-order, or "" if none.
pub fn find_plain_text(root: &MimePart) -> String {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            MimePart::Leaf { mime_type, data } => {
                if mime_type == "text/plain"
                    && let Some(data) = data
                {
                    let text = decode_body_data(data);
                    if !text.is_empty() {
                        return text;
                    }
                }
            }
            // reversed so the first child is popped first
            MimePart::Branch { parts, .. } => stack.extend(parts.iter().rev()),
        }
    }

    String::new()
}

/// Lower-cased header name -> value; later duplicates overwrite earlier ones.
pub fn header_map(headers: &[RawHeader]) -> HashMap<String, String> {
    headers
        .iter()
        .map(|h| (h.name.to_ascii_lowercase(), h.value.clone()))
        .collect()
}

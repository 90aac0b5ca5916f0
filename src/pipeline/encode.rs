//! Upload encoding: raw file bytes → base64 for `POST /convert/base64`.
//!
//! The upload endpoint takes the whole file inline in the JSON body rather
//! than as multipart form data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Encode a file for the `file_base64` request field.
pub fn encode_file(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_small_file() {
        let encoded = encode_file(b"%PDF-1.7");
        assert_eq!(encoded, "JVBERi0xLjc=");
        let decoded = STANDARD.decode(&encoded).expect("valid base64");
        assert_eq!(decoded, b"%PDF-1.7");
    }

    #[test]
    fn encode_empty_file() {
        assert_eq!(encode_file(&[]), "");
    }
}

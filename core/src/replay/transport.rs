//! Base64 transport encoding for replays in upload payloads and API responses.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::binary::{DecodeError, DecodeOptions, decode_with};
use super::types::ReplayRecord;

/// Standard base64 of the replay bytes.
pub fn encode_b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 text to raw replay bytes.
pub fn b64_to_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(text.trim())?)
}

/// Decode a base64 upload straight to a checked replay.
pub fn decode_b64(text: &str, options: &DecodeOptions) -> Result<ReplayRecord, DecodeError> {
    decode_with(&b64_to_bytes(text)?, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::binary::encode;
    use crate::replay::types::{InputFrame, ReplayHeader};

    #[test]
    fn test_b64_upload() {
        let header = ReplayHeader {
            elapsed_time: 0.08,
            ..ReplayHeader::default()
        };
        let bytes = encode(&header, &[InputFrame::DASH; 8]).unwrap();
        let text = encode_b64(&bytes);

        let record = decode_b64(&text, &DecodeOptions::default()).unwrap();
        assert_eq!(record.raw(), bytes.as_slice());
        assert_eq!(record.frame_count(), 8);
    }

    #[test]
    fn test_invalid_b64() {
        assert!(matches!(
            decode_b64("not base64!!", &DecodeOptions::default()),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_valid_b64_bad_replay() {
        assert_eq!(
            decode_b64(&encode_b64(&[1, 2, 3]), &DecodeOptions::default()),
            Err(DecodeError::Truncated { len: 3 })
        );
    }
}

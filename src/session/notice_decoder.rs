use crate::notices::DecodeError;

/// Decodes opaque notice payloads into their string form. The encoding
/// belongs to the on-chain backend; swapping the decoder swaps the
/// encoding without touching the flows.
pub trait NoticeDecoder {
    fn decode_score_notice(&self, payload: &[u8]) -> Result<String, DecodeError>;
    fn decode_verify_replay_notice(&self, payload: &[u8]) -> Result<String, DecodeError>;
}

/// Decoder for nodes that emit plain text payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8NoticeDecoder;

impl NoticeDecoder for Utf8NoticeDecoder {
    fn decode_score_notice(&self, payload: &[u8]) -> Result<String, DecodeError> {
        decode_text(payload)
    }

    fn decode_verify_replay_notice(&self, payload: &[u8]) -> Result<String, DecodeError> {
        decode_text(payload)
    }
}

fn decode_text(payload: &[u8]) -> Result<String, DecodeError> {
    String::from_utf8(payload.to_vec()).map_err(|_| DecodeError::NotText)
}

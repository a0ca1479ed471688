//! Transport encoding for binary payloads.
//!
//! Binary content is held and sent as padded standard base64. Text content
//! never passes through here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Base64 text standing in for raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedBytes(String);

impl EncodedBytes {
    /// Wrap text received from outside. Validity is only checked on [`decode`].
    pub fn from_transport(text: impl Into<String>) -> Self {
        EncodedBytes(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Byte length of the decoded payload, derived from the padded encoding.
    /// Exact for output of [`encode`]; never underflows on malformed input.
    pub fn decoded_len(&self) -> usize {
        let s = self.0.as_bytes();
        if s.is_empty() {
            return 0;
        }
        let padding = s.iter().rev().take_while(|&&b| b == b'=').count().min(2);
        ((s.len() / 4) * 3).saturating_sub(padding)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed transport encoding: {0}")]
pub struct EncodingError(#[from] base64::DecodeError);

pub fn encode(bytes: &[u8]) -> EncodedBytes {
    EncodedBytes(STANDARD.encode(bytes))
}

pub fn decode(encoded: &EncodedBytes) -> Result<Vec<u8>, EncodingError> {
    Ok(STANDARD.decode(encoded.as_str())?)
}

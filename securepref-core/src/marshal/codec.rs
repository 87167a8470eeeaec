//! Structured serializer used for maps, sets and arbitrary objects.

use serde_json::Value;
use thiserror::Error;

/// Errors raised by a [`StructuredCodec`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be rendered.
    #[error("failed to serialize structured value: {0}")]
    Serialize(String),

    /// The stored text could not be parsed.
    #[error("failed to deserialize structured value: {0}")]
    Deserialize(String),
}

/// Converts JSON trees to and from their stored text.
///
/// Typing of the tree into the caller's type happens afterwards through
/// serde, so an implementation only has to preserve the tree.
pub trait StructuredCodec: Send + Sync {
    /// Renders `value` as text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialize`] if the value cannot be rendered.
    fn to_json(&self, value: &Value) -> Result<String, CodecError>;

    /// Parses text produced by [`Self::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Deserialize`] if the text is malformed.
    fn from_json(&self, json: &str) -> Result<Value, CodecError>;
}

/// Compact JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl StructuredCodec for JsonCodec {
    fn to_json(&self, value: &Value) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    fn from_json(&self, json: &str) -> Result<Value, CodecError> {
        serde_json::from_str(json).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}

//! Error types for the encrypted preference store.

use thiserror::Error;

/// Result type for preference operations.
pub type PrefsResult<T> = Result<T, PrefsError>;

/// Errors raised by the preference store and its components.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// The secure key could not be turned into cipher key material.
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    /// A cipher operation failed (bad base64, truncated ciphertext, bad padding).
    #[error("cipher error: {0}")]
    Cipher(String),

    /// A stored primitive could not be parsed as the requested type.
    #[error("format error for key '{key}': cannot parse {type_name}: {reason}")]
    Format {
        /// Preference key being decoded.
        key: String,
        /// Name of the requested type.
        type_name: String,
        /// Parser message.
        reason: String,
    },

    /// The requested type has no decode path.
    #[error("unsupported type '{type_name}' for key '{key}'")]
    UnsupportedType {
        /// Name of the rejected type.
        type_name: String,
        /// Preference key being accessed.
        key: String,
    },

    /// A strict accessor found no value for the key.
    #[error("missing key '{key}'")]
    MissingKey {
        /// The missing preference key.
        key: String,
    },

    /// The structured codec failed, or a decoded value did not match the target type.
    #[error("codec error for key '{key}': {reason}")]
    Codec {
        /// Preference key being encoded or decoded.
        key: String,
        /// Codec message.
        reason: String,
    },

    /// Errors coming from the backing store.
    #[error("backing store error: {0}")]
    Backing(String),

    /// An I/O operation of a file-backed store failed.
    #[error("I/O error during {context}: {source}")]
    Io {
        /// Context describing the operation.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An index-based container operation was out of range.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Length of the collection.
        len: usize,
    },

    /// A cursor operation was called in the wrong state.
    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl PrefsError {
    /// Creates a cipher error.
    pub fn cipher<S: Into<String>>(message: S) -> Self {
        Self::Cipher(message.into())
    }

    /// Creates a key derivation error.
    pub fn key_derivation<S: Into<String>>(message: S) -> Self {
        Self::KeyDerivation(message.into())
    }

    /// Creates a format error for `key`.
    pub fn format<K, T, R>(key: K, type_name: T, reason: R) -> Self
    where
        K: Into<String>,
        T: Into<String>,
        R: Into<String>,
    {
        Self::Format {
            key: key.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a codec error for `key`.
    pub fn codec<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::Codec {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a backing store error.
    pub fn backing<S: Into<String>>(message: S) -> Self {
        Self::Backing(message.into())
    }

    /// Creates an I/O error with context.
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` for errors raised by the cipher layer.
    #[must_use]
    pub const fn is_cipher(&self) -> bool {
        matches!(self, Self::Cipher(_))
    }
}

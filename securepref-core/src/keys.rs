//! Key material: the device-derived secure key and the cipher key hashed from it.
//!
//! The cipher key is `SHA-256(UTF-8(secure_key))`, used directly as the
//! AES-256 key. The derivation has no salt and no stretching; stores written
//! by other implementations sharing the same secure key depend on that.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PrefsError, PrefsResult};

/// Length in bytes of the derived AES-256 key.
pub const DERIVED_KEY_LEN: usize = 32;

/// Device-derived secret the cipher keys are hashed from.
///
/// Normally a UUID string produced by [`crate::identity::generate_secure_key`].
/// It is never persisted and never printed.
pub struct SecureKey(SecretString);

impl SecureKey {
    /// Wraps a secret string.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::KeyDerivation`] if the secret is empty.
    pub fn new<S: Into<String>>(secret: S) -> PrefsResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(PrefsError::key_derivation("secure key must not be empty"));
        }
        Ok(Self(SecretString::from(secret)))
    }

    /// Wraps a secret read as raw bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::KeyDerivation`] if the bytes are not valid UTF-8
    /// or are empty.
    pub fn from_utf8(bytes: Vec<u8>) -> PrefsResult<Self> {
        let secret = String::from_utf8(bytes).map_err(|err| {
            let mut bytes = err.into_bytes();
            bytes.zeroize();
            PrefsError::key_derivation("secure key is not valid UTF-8")
        })?;
        Self::new(secret)
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SecureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecureKey").field(&"[REDACTED]").finish()
    }
}

/// AES-256 key derived from a [`SecureKey`]. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_LEN]);

impl DerivedKey {
    /// Hashes the UTF-8 bytes of `secure_key` with SHA-256.
    #[must_use]
    pub fn derive(secure_key: &SecureKey) -> Self {
        let digest: [u8; DERIVED_KEY_LEN] = Sha256::digest(secure_key.expose().as_bytes()).into();
        Self(digest)
    }

    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DERIVED_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes. Treat this as sensitive material.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

//! Symmetric cipher for preference values and key names.
//!
//! Values use AES-256-CBC with PKCS#7 padding under a fixed IV. Key names use
//! AES-256-ECB with PKCS#7 padding so that the same plaintext key always maps
//! to the same stored key. Every ciphertext is carried as standard padded
//! base64.
//!
//! # Security
//!
//! The fixed IV and the ECB key-name mode leak equality of plaintexts. They are
//! kept so that stores written by existing installations stay readable. Do not
//! reuse this module for anything that needs confidentiality against an
//! attacker who can read the backing store.

use aes::{
    cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit},
    Aes256,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{PrefsError, PrefsResult};
use crate::keys::{DerivedKey, SecureKey};

type ValueEncryptor = cbc::Encryptor<Aes256>;
type ValueDecryptor = cbc::Decryptor<Aes256>;
type KeyEncryptor = ecb::Encryptor<Aes256>;
type KeyDecryptor = ecb::Decryptor<Aes256>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Seed string of the fixed value IV. Only the first [`BLOCK_SIZE`] bytes are used.
const IV_SEED: &[u8] = b"fldsjfodasjifudslfjdsaofshaufihadsf";

fn fixed_iv() -> [u8; BLOCK_SIZE] {
    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&IV_SEED[..BLOCK_SIZE]);
    iv
}

/// Encrypts and decrypts values and key names under one derived key.
#[derive(Clone, Debug)]
pub struct CipherCodec {
    key: DerivedKey,
    iv: [u8; BLOCK_SIZE],
}

impl CipherCodec {
    /// Derives the cipher key from `secure_key`.
    #[must_use]
    pub fn new(secure_key: &SecureKey) -> Self {
        Self::from_derived(DerivedKey::derive(secure_key))
    }

    /// Builds a codec over an already derived key.
    #[must_use]
    pub fn from_derived(key: DerivedKey) -> Self {
        Self {
            key,
            iv: fixed_iv(),
        }
    }

    /// Encrypts a payload with AES-256-CBC and returns base64 text.
    #[must_use]
    pub fn encrypt(&self, plaintext: &[u8]) -> String {
        let ciphertext = ValueEncryptor::new(self.key.as_bytes().into(), (&self.iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        STANDARD.encode(ciphertext)
    }

    /// Decrypts base64 text produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Cipher`] on invalid base64, a ciphertext that is
    /// not a whole number of blocks, or bad padding.
    pub fn decrypt(&self, encoded: &str) -> PrefsResult<Vec<u8>> {
        let ciphertext = decode_blocks(encoded)?;
        ValueDecryptor::new(self.key.as_bytes().into(), (&self.iv).into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| PrefsError::cipher("bad padding in value ciphertext"))
    }

    /// Encrypts a UTF-8 string value.
    #[must_use]
    pub fn encrypt_str(&self, plaintext: &str) -> String {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypts a value and interprets it as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Cipher`] if decryption fails or the plaintext is
    /// not UTF-8.
    pub fn decrypt_str(&self, encoded: &str) -> PrefsResult<String> {
        into_utf8(self.decrypt(encoded)?)
    }

    /// Encrypts a key name with AES-256-ECB. Deterministic.
    #[must_use]
    pub fn encrypt_key(&self, key: &str) -> String {
        let ciphertext = KeyEncryptor::new(self.key.as_bytes().into())
            .encrypt_padded_vec_mut::<Pkcs7>(key.as_bytes());
        STANDARD.encode(ciphertext)
    }

    /// Reverses [`Self::encrypt_key`].
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Cipher`] if `encoded` was not produced by
    /// [`Self::encrypt_key`] under the same key.
    pub fn decrypt_key(&self, encoded: &str) -> PrefsResult<String> {
        let ciphertext = decode_blocks(encoded)?;
        let plaintext = KeyDecryptor::new(self.key.as_bytes().into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| PrefsError::cipher("bad padding in key ciphertext"))?;
        into_utf8(plaintext)
    }
}

fn decode_blocks(encoded: &str) -> PrefsResult<Vec<u8>> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|err| PrefsError::cipher(format!("invalid base64: {err}")))?;
    if bytes.is_empty() || bytes.len() % BLOCK_SIZE != 0 {
        return Err(PrefsError::cipher(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn into_utf8(bytes: Vec<u8>) -> PrefsResult<String> {
    String::from_utf8(bytes).map_err(|_| PrefsError::cipher("plaintext is not valid UTF-8"))
}

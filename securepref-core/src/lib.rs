//! Encrypted, typed preferences over a plaintext key-value store.
//!
//! Values are encrypted with AES-256-CBC and stored as base64 text. Key names
//! are encrypted deterministically with AES-256-ECB unless
//! [`PrefsConfig::encrypt_keys`] is off. The cipher key is the SHA-256 digest
//! of a device-derived [`SecureKey`].
//!
//! The layers, bottom up:
//!
//! - [`platform`]: the plaintext [`BackingStore`] and its in-memory and file
//!   implementations.
//! - [`cipher`] and [`keys`]: key derivation and the value and key ciphers.
//! - [`store`]: [`EncryptedStore`], strings in, ciphertext out, with change
//!   listeners keyed by plaintext key.
//! - [`marshal`]: typed values to and from the stored string.
//! - [`observable`]: collections that write themselves back on mutation.
//! - [`Preferences`] and the [`binding`] accessors on top.
//!
//! The on-disk format is shared with existing installations and is not
//! suitable as a defence against an attacker who can read the backing store;
//! see [`cipher`].

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod binding;
pub mod cipher;
pub mod config;
pub mod error;
pub mod identity;
pub mod keys;
pub mod marshal;
pub mod observable;
pub mod platform;
mod prefs;
pub mod store;

pub use binding::{Binding, MutableBinding};
pub use cipher::CipherCodec;
pub use config::PrefsConfig;
pub use error::{PrefsError, PrefsResult};
pub use identity::{DeviceIdentity, StaticIdentity};
pub use keys::{DerivedKey, SecureKey};
pub use marshal::{Json, Marshal, PrefValue, TypeDescriptor};
pub use platform::{BackingStore, FileBackingStore, MemoryBackingStore, StoreObserver};
pub use prefs::{Observe, Preferences};
pub use store::{ChangeListener, EncryptedStore};

//! Common test utilities shared across integration tests.

#![allow(dead_code, reason = "used in tests")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use securepref_core::marshal::{CodecError, JsonCodec, StructuredCodec};
use securepref_core::{MemoryBackingStore, Preferences, PrefsConfig, SecureKey};
use serde_json::Value;

pub const DEVICE_KEY: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

pub fn secure_key() -> SecureKey {
    SecureKey::new(DEVICE_KEY).expect("secure key")
}

pub fn memory_prefs() -> (Arc<MemoryBackingStore>, Preferences) {
    memory_prefs_with(&PrefsConfig::default())
}

pub fn memory_prefs_with(config: &PrefsConfig) -> (Arc<MemoryBackingStore>, Preferences) {
    let backing = Arc::new(MemoryBackingStore::new());
    let prefs = Preferences::open(backing.clone(), &secure_key(), config);
    (backing, prefs)
}

/// JSON codec that counts how often it is used.
#[derive(Default)]
pub struct RecordingCodec {
    pub to_json_calls: AtomicUsize,
    pub from_json_calls: AtomicUsize,
}

impl RecordingCodec {
    pub fn to_json_count(&self) -> usize {
        self.to_json_calls.load(Ordering::SeqCst)
    }

    pub fn from_json_count(&self) -> usize {
        self.from_json_calls.load(Ordering::SeqCst)
    }
}

impl StructuredCodec for RecordingCodec {
    fn to_json(&self, value: &Value) -> Result<String, CodecError> {
        self.to_json_calls.fetch_add(1, Ordering::SeqCst);
        JsonCodec.to_json(value)
    }

    fn from_json(&self, json: &str) -> Result<Value, CodecError> {
        self.from_json_calls.fetch_add(1, Ordering::SeqCst);
        JsonCodec.from_json(json)
    }
}

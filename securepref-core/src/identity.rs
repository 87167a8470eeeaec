//! Device identity sources and secure key generation.
//!
//! The secure key is a UUID string derived from a stable device identifier:
//! the hardware id when it is usable, otherwise the telephony id, otherwise a
//! random UUID. Named UUIDs are version 3 (MD5) over the raw identifier bytes,
//! which matches the name-based UUIDs produced by the JVM, so keys derived on
//! other runtimes from the same identifier agree.

use md5::{Digest, Md5};
use uuid::{Builder, Uuid};

use crate::error::PrefsResult;
use crate::keys::SecureKey;

/// Hardware id reported by a batch of broken devices. Treated as absent.
pub const BROKEN_HARDWARE_ID: &str = "9774d56d682e549c";

/// Source of stable device identifiers.
pub trait DeviceIdentity: Send + Sync {
    /// Stable hardware identifier, if the platform exposes one.
    fn hardware_id(&self) -> Option<String>;

    /// Telephony device identifier, if available and permitted.
    fn telephony_id(&self) -> Option<String>;
}

/// Fixed identifiers, used by tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    hardware_id: Option<String>,
    telephony_id: Option<String>,
}

impl StaticIdentity {
    /// Creates an identity from explicit identifiers.
    #[must_use]
    pub const fn new(hardware_id: Option<String>, telephony_id: Option<String>) -> Self {
        Self {
            hardware_id,
            telephony_id,
        }
    }

    /// Creates an identity with only a hardware id.
    #[must_use]
    pub fn hardware<S: Into<String>>(hardware_id: S) -> Self {
        Self::new(Some(hardware_id.into()), None)
    }
}

impl DeviceIdentity for StaticIdentity {
    fn hardware_id(&self) -> Option<String> {
        self.hardware_id.clone()
    }

    fn telephony_id(&self) -> Option<String> {
        self.telephony_id.clone()
    }
}

/// Name-based (version 3) UUID over `name`.
#[must_use]
pub fn name_uuid(name: &[u8]) -> Uuid {
    let digest: [u8; 16] = Md5::digest(name).into();
    Builder::from_md5_bytes(digest).into_uuid()
}

/// Produces the UUID string used as secure key for this device.
#[must_use]
pub fn device_uuid(identity: &dyn DeviceIdentity) -> Uuid {
    if let Some(id) = identity
        .hardware_id()
        .filter(|id| !id.is_empty() && id != BROKEN_HARDWARE_ID)
    {
        return name_uuid(id.as_bytes());
    }
    if let Some(id) = identity.telephony_id().filter(|id| !id.trim().is_empty()) {
        tracing::debug!("hardware id unusable, deriving secure key from telephony id");
        return name_uuid(id.as_bytes());
    }
    tracing::warn!(
        "no stable device identifier, using a random secure key; values written now will not be readable after restart"
    );
    Uuid::new_v4()
}

/// Generates the [`SecureKey`] for this device.
///
/// # Errors
///
/// Only fails if the UUID string is rejected by [`SecureKey::new`], which does
/// not happen for a well-formed UUID.
pub fn generate_secure_key(identity: &dyn DeviceIdentity) -> PrefsResult<SecureKey> {
    SecureKey::new(device_uuid(identity).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_uuid_matches_jvm_vector() {
        assert_eq!(
            name_uuid(b"abc").to_string(),
            "90015098-3cd2-3fb0-9696-3f7d28e17f72"
        );
    }

    #[test]
    fn test_name_uuid_is_version_3() {
        assert_eq!(name_uuid(b"android-1234").get_version_num(), 3);
    }

    #[test]
    fn test_hardware_id_preferred() {
        let identity = StaticIdentity::new(Some("abc".into()), Some("imei".into()));
        assert_eq!(device_uuid(&identity), name_uuid(b"abc"));
    }

    #[test]
    fn test_broken_hardware_id_falls_back_to_telephony() {
        let identity = StaticIdentity::new(Some(BROKEN_HARDWARE_ID.into()), Some("imei".into()));
        assert_eq!(device_uuid(&identity), name_uuid(b"imei"));
    }

    #[test]
    fn test_blank_ids_fall_back_to_random() {
        let identity = StaticIdentity::new(Some(String::new()), None);
        let first = device_uuid(&identity);
        let second = device_uuid(&identity);
        assert_eq!(first.get_version_num(), 4);
        assert_ne!(first, second);
    }

    #[test]
    fn test_whitespace_telephony_id_falls_back_to_random() {
        let identity = StaticIdentity::new(None, Some(" \t ".into()));
        let first = device_uuid(&identity);
        assert_eq!(first.get_version_num(), 4);
        assert_ne!(first, device_uuid(&identity));
    }

    #[test]
    fn test_generate_secure_key_is_stable() {
        let identity = StaticIdentity::hardware("android-1234");
        let first = crate::keys::DerivedKey::derive(&generate_secure_key(&identity).unwrap());
        let second = crate::keys::DerivedKey::derive(&generate_secure_key(&identity).unwrap());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }
}

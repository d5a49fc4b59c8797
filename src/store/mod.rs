//! Secret store client.
//!
//! [`SecretStore`] is what the renderer talks to: list every secret visible in a
//! region, then fetch each decrypted value under an encryption context.
//! [`VaultStore`] is the bundled implementation, one encrypted store file per region.

pub mod crypto;
pub mod secret;
pub mod vault;

use std::fmt;

use crate::context::EncryptionContext;
use crate::error::Result;

pub use secret::{SecretMap, SecretRef, StoredSecret};
pub use vault::VaultStore;

/// Read access to a regional secret store.
pub trait SecretStore {
    /// Every distinct secret name in `region`, latest version, ordered by name.
    fn list_secrets(&self, region: &str) -> Result<Vec<SecretRef>>;

    /// Decrypted value of the latest version of `name`.
    fn get_secret(&self, name: &str, region: &str, context: &EncryptionContext) -> Result<String>;
}

/// Credentials that unlock a region store's identity.
///
/// A passphrase unseals the identity kept inside the store file; a keyfile
/// identity is used directly and must match the store's recipient.
#[derive(Clone)]
pub enum StoreKey {
    Passphrase(String),
    Keyfile { identity: String, pubkey: String },
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKey::Passphrase(_) => f.write_str("StoreKey::Passphrase(..)"),
            StoreKey::Keyfile { pubkey, .. } => write!(f, "StoreKey::Keyfile({})", pubkey),
        }
    }
}

/// Check if a region matches [A-Za-z0-9_-]+
pub fn is_valid_region(region: &str) -> bool {
    !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::NamedTempFile;
use tracing::debug;
use zeroize::Zeroizing;

use crate::context::EncryptionContext;
use crate::error::{ReplacerError, Result};
use crate::store::crypto;
use crate::store::secret::{SecretRef, StoredSecret};
use crate::store::{is_valid_region, SecretStore, StoreKey};
use crate::types::*;

const STORE_FORMAT_VERSION: u32 = 2;
const STORE_EXTENSION: &str = "store";

/// On-disk contents of one region's store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionStore {
    pub version: u32,
    pub region: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// age x25519 recipient every value in this store is encrypted to.
    pub recipient: String,
    /// The matching identity sealed with the passphrase, base64 encoded.
    /// `None` when the store is opened with a keyfile.
    pub sealed_identity: Option<String>,
    /// Every stored version per secret name, oldest first.
    pub secrets: BTreeMap<String, Vec<StoredSecret>>,
}

impl RegionStore {
    /// Create a new empty region store.
    pub fn new(region: &str, recipient: String, sealed_identity: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            version: STORE_FORMAT_VERSION,
            region: region.to_string(),
            created_at: now,
            modified_at: now,
            recipient,
            sealed_identity,
            secrets: BTreeMap::new(),
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    pub fn latest(&self, name: &str) -> Option<&StoredSecret> {
        self.secrets
            .get(name)
            .and_then(|versions| versions.iter().max_by_key(|s| s.version))
    }
}

/// A loaded region store together with its unlocked identity.
struct OpenRegion {
    store: RegionStore,
    identity: Zeroizing<String>,
    binding_key: Zeroizing<Vec<u8>>,
}

impl OpenRegion {
    fn new(store: RegionStore, identity: Zeroizing<String>) -> Result<Self> {
        let binding_key = crypto::derive_binding_key(&identity)?;
        Ok(Self {
            store,
            identity,
            binding_key,
        })
    }
}

/// File-backed regional store: `<root>/<region>.store`.
///
/// Each store file holds one age identity; values are encrypted to its recipient.
/// A region is unlocked once per `VaultStore` and kept open, so reading many secrets
/// costs a single passphrase unwrap. Writes are single-writer: `put_secret` reloads,
/// modifies and replaces the whole file, and concurrent writers to the same region
/// can lose each other's updates.
pub struct VaultStore {
    root: PathBuf,
    key: StoreKey,
    open: Mutex<BTreeMap<String, Arc<OpenRegion>>>,
    unlocks: AtomicUsize,
}

impl VaultStore {
    pub fn new(root: impl Into<PathBuf>, key: StoreKey) -> Self {
        Self {
            root: root.into(),
            key,
            open: Mutex::new(BTreeMap::new()),
            unlocks: AtomicUsize::new(0),
        }
    }

    /// Path of the store file for a region.
    pub fn store_path(&self, region: &str) -> Result<PathBuf> {
        if !is_valid_region(region) {
            return Err(ReplacerError::InvalidRegion(region.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", region, STORE_EXTENSION)))
    }

    /// Load a region's store file.
    pub fn load(&self, region: &str) -> Result<RegionStore> {
        let path = self.store_path(region)?;
        if !path.exists() {
            return Err(ReplacerError::StoreUnavailable {
                region: region.to_string(),
                path: path.display().to_string(),
            });
        }

        let bytes = fs::read(&path)?;
        let store: RegionStore = rmp_serde::from_slice(&bytes)
            .map_err(|e| ReplacerError::Serialization(e.to_string()))?;
        Ok(store)
    }

    /// Replace a region's store file through a uniquely named temp file in the same directory.
    fn save(&self, store: &RegionStore) -> Result<()> {
        let path = self.store_path(&store.region)?;
        fs::create_dir_all(&self.root)?;

        let bytes =
            rmp_serde::to_vec(store).map_err(|e| ReplacerError::Serialization(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| ReplacerError::Io(e.error))?;

        Ok(())
    }

    /// Store a new version of a secret, bound to `context`. Returns the new version number.
    ///
    /// Creates the region store on first use. A passphrase key gets a fresh identity
    /// sealed into the file; a keyfile key makes its own recipient the store's.
    pub fn put_secret(
        &self,
        region: &str,
        name: &str,
        value: &str,
        context: &EncryptionContext,
    ) -> Result<u32> {
        if name.is_empty() {
            return Err(ReplacerError::InvalidSecretName(name.to_string()));
        }

        let mut open = self.lock_open();
        let (mut store, identity) = match self.load(region) {
            Ok(store) => {
                let cached = open.get(region).filter(|o| {
                    o.store.recipient == store.recipient
                        && o.store.sealed_identity == store.sealed_identity
                });
                let identity = match cached {
                    Some(o) => o.identity.clone(),
                    None => self.unlock(&store)?,
                };
                (store, identity)
            }
            Err(ReplacerError::StoreUnavailable { .. }) => self.create_region(region)?,
            Err(e) => return Err(e),
        };

        let version = store.latest(name).map(|s| s.version + 1).unwrap_or(1);
        let ciphertext = crypto::encrypt(value.as_bytes(), &store.recipient)?;
        let binding_key = crypto::derive_binding_key(&identity)?;
        let hmac = crypto::binding_hmac(&binding_key, name, version, context, &ciphertext)?;

        store
            .secrets
            .entry(name.to_string())
            .or_default()
            .push(StoredSecret {
                name: name.to_string(),
                version,
                created_at: Utc::now(),
                contents: STANDARD.encode(&ciphertext),
                hmac,
            });
        store.touch();
        self.save(&store)?;
        open.insert(region.to_string(), Arc::new(OpenRegion::new(store, identity)?));

        debug!(region, secret = name, version, "stored secret");
        Ok(version)
    }

    fn create_region(&self, region: &str) -> Result<(RegionStore, Zeroizing<String>)> {
        match &self.key {
            StoreKey::Passphrase(passphrase) => {
                let (identity, recipient) = crypto::generate_keypair();
                let identity = Zeroizing::new(identity);
                let sealed = crypto::seal_identity(&identity, passphrase)?;
                let store = RegionStore::new(region, recipient, Some(STANDARD.encode(sealed)));
                Ok((store, identity))
            }
            StoreKey::Keyfile { identity, pubkey } => {
                let store = RegionStore::new(region, pubkey.clone(), None);
                Ok((store, Zeroizing::new(identity.clone())))
            }
        }
    }

    /// Recover the identity of a loaded store with this store's key.
    fn unlock(&self, store: &RegionStore) -> Result<Zeroizing<String>> {
        match (&self.key, &store.sealed_identity) {
            (StoreKey::Passphrase(passphrase), Some(sealed)) => {
                let sealed = STANDARD
                    .decode(sealed)
                    .map_err(|e| ReplacerError::Serialization(e.to_string()))?;
                self.unlocks.fetch_add(1, Ordering::Relaxed);
                debug!(region = %store.region, "unsealing store identity");
                crypto::unseal_identity(&sealed, passphrase)
            }
            (StoreKey::Keyfile { identity, pubkey }, None) => {
                if *pubkey != store.recipient {
                    return Err(ReplacerError::Decryption(format!(
                        "Keyfile does not match the store for region '{}'",
                        store.region
                    )));
                }
                Ok(Zeroizing::new(identity.clone()))
            }
            (StoreKey::Passphrase(_), None) => Err(ReplacerError::Decryption(format!(
                "Store for region '{}' is keyfile-protected",
                store.region
            ))),
            (StoreKey::Keyfile { .. }, Some(_)) => Err(ReplacerError::Decryption(format!(
                "Store for region '{}' is passphrase-protected",
                store.region
            ))),
        }
    }

    /// Load and unlock a region once, then serve it from memory.
    fn open_region(&self, region: &str) -> Result<Arc<OpenRegion>> {
        let mut open = self.lock_open();
        if let Some(region_store) = open.get(region) {
            return Ok(Arc::clone(region_store));
        }

        let store = self.load(region)?;
        let identity = self.unlock(&store)?;
        let region_store = Arc::new(OpenRegion::new(store, identity)?);
        open.insert(region.to_string(), Arc::clone(&region_store));
        Ok(region_store)
    }

    fn lock_open(&self) -> MutexGuard<'_, BTreeMap<String, Arc<OpenRegion>>> {
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn unlocks(&self) -> usize {
        self.unlocks.load(Ordering::Relaxed)
    }
}

impl SecretStore for VaultStore {
    fn list_secrets(&self, region: &str) -> Result<Vec<SecretRef>> {
        let open = self.open_region(region)?;
        let store = &open.store;
        let refs = store
            .secrets
            .keys()
            .filter_map(|name| store.latest(name))
            .map(|s| SecretRef {
                name: s.name.clone(),
                version: s.version,
            })
            .collect();
        Ok(refs)
    }

    fn get_secret(&self, name: &str, region: &str, context: &EncryptionContext) -> Result<String> {
        let open = self.open_region(region)?;
        let entry = open
            .store
            .latest(name)
            .ok_or_else(|| ReplacerError::SecretNotFound(name.to_string()))?;

        let ciphertext = STANDARD
            .decode(&entry.contents)
            .map_err(|e| ReplacerError::Serialization(e.to_string()))?;
        let plaintext = crypto::decrypt(&ciphertext, &open.identity)?;

        let expected =
            crypto::binding_hmac(&open.binding_key, name, entry.version, context, &ciphertext)?;
        if !crypto::verify_binding(&entry.hmac, &expected)? {
            return Err(ReplacerError::ContextMismatch(name.to_string()));
        }

        String::from_utf8(plaintext.to_vec()).map_err(|_| {
            ReplacerError::Decryption(format!("Secret '{}' is not valid UTF-8", name))
        })
    }
}

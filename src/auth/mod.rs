use std::env;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{ReplacerError, Result};
use crate::store::StoreKey;

const CREDREPLACER_KEYFILE_ENV: &str = "CREDREPLACER_KEYFILE";
const CREDREPLACER_PASSPHRASE_ENV: &str = "CREDREPLACER_PASSPHRASE";

/// Resolve the store key. Tries in order:
/// 1. CREDREPLACER_KEYFILE env var (age identity file)
/// 2. CREDREPLACER_PASSPHRASE env var
/// 3. `auth.keyfile` from the config file
pub fn resolve_key(config: &Config) -> Result<StoreKey> {
    if let Ok(keyfile_path) = env::var(CREDREPLACER_KEYFILE_ENV) {
        debug!(keyfile = %keyfile_path, "using keyfile from environment");
        return read_keyfile(Path::new(&keyfile_path));
    }

    if let Ok(passphrase) = env::var(CREDREPLACER_PASSPHRASE_ENV) {
        debug!("using passphrase from environment");
        return Ok(StoreKey::Passphrase(passphrase));
    }

    if let Some(keyfile_path) = config.keyfile() {
        debug!(keyfile = %keyfile_path.display(), "using keyfile from config");
        return read_keyfile(&keyfile_path);
    }

    Err(ReplacerError::AuthFailed(
        "No credentials provided. Set CREDREPLACER_KEYFILE or CREDREPLACER_PASSPHRASE, or auth.keyfile in the config file.".into(),
    ))
}

/// Read an age keyfile from disk.
pub fn read_keyfile(path: &Path) -> Result<StoreKey> {
    let content = fs::read_to_string(path).map_err(|e| {
        ReplacerError::InvalidKeyfile(format!("Cannot read {}: {}", path.display(), e))
    })?;

    // age-keygen output carries comment lines above the key
    let identity_line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .ok_or_else(|| {
            ReplacerError::InvalidKeyfile(format!("No identity found in {}", path.display()))
        })?;

    let identity: age::x25519::Identity = identity_line
        .parse()
        .map_err(|e: &str| ReplacerError::InvalidKeyfile(e.to_string()))?;

    let pubkey = identity.to_public().to_string();
    Ok(StoreKey::Keyfile {
        identity: identity_line.to_string(),
        pubkey,
    })
}

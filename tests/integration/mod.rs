mod error_test;
mod render_test;

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use credentials_replacer::context::{self, EncryptionContext};
use credentials_replacer::store::{crypto, StoreKey, VaultStore};
use tempfile::TempDir;

/// An isolated HOME with a keyfile and an empty store directory.
pub struct Fixture {
    pub home: TempDir,
    pub keyfile: PathBuf,
    key: StoreKey,
}

impl Fixture {
    pub fn new() -> Self {
        let home = TempDir::new().unwrap();
        let (identity, pubkey) = crypto::generate_keypair();
        let keyfile = home.path().join("key.txt");
        fs::write(&keyfile, format!("# public key: {}\n{}\n", pubkey, identity)).unwrap();
        Self {
            home,
            keyfile,
            key: StoreKey::Keyfile { identity, pubkey },
        }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.home.path().join(".credreplacer").join("stores")
    }

    pub fn store(&self) -> VaultStore {
        VaultStore::new(self.store_dir(), self.key.clone())
    }

    pub fn put(&self, region: &str, name: &str, value: &str) {
        self.store()
            .put_secret(region, name, value, &EncryptionContext::new())
            .unwrap();
    }

    pub fn put_with_context(&self, region: &str, name: &str, value: &str, pairs: &[&str]) {
        let ctx = context::from_args(pairs).unwrap();
        self.store().put_secret(region, name, value, &ctx).unwrap();
    }

    pub fn template(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Command with HOME isolated and the fixture keyfile as credentials.
    pub fn cmd(&self) -> Command {
        let mut cmd = bare_cmd(self.home.path());
        cmd.env("CREDREPLACER_KEYFILE", &self.keyfile);
        cmd
    }
}

/// Command with HOME isolated and no credentials at all.
pub fn bare_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("credentials-replacer").unwrap();
    cmd.env("HOME", home);
    cmd.env_remove("CREDREPLACER_KEYFILE");
    cmd.env_remove("CREDREPLACER_PASSPHRASE");
    cmd.env_remove("CREDREPLACER_CONFIG");
    cmd.env_remove("CREDREPLACER_STORE_DIR");
    cmd.env_remove("CREDREPLACER_LOG");
    cmd
}

//! Store cryptography.
//!
//! Every region store has one x25519 identity. Secret values are encrypted to its
//! recipient; in passphrase mode the identity itself is sealed with the passphrase,
//! so a store costs a single scrypt unwrap no matter how many secrets it holds.

use std::io::{Read, Write};

use age::secrecy::ExposeSecret;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::context::{self, EncryptionContext};
use crate::error::{ReplacerError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Encrypt a secret value to a store recipient.
pub fn encrypt(plaintext: &[u8], recipient: &str) -> Result<Vec<u8>> {
    let recipient: age::x25519::Recipient = recipient
        .parse()
        .map_err(|e: &str| ReplacerError::Encryption(e.to_string()))?;
    let encryptor = age::Encryptor::with_recipients(vec![Box::new(recipient)])
        .ok_or_else(|| ReplacerError::Encryption("No recipients".into()))?;
    seal(encryptor, plaintext)
}

/// Decrypt a secret value with the store identity. The returned buffer is wiped on drop.
pub fn decrypt(ciphertext: &[u8], identity: &str) -> Result<Zeroizing<Vec<u8>>> {
    let identity: age::x25519::Identity = identity
        .parse()
        .map_err(|e: &str| ReplacerError::InvalidKeyfile(e.to_string()))?;

    let reader = match open(ciphertext)? {
        age::Decryptor::Recipients(d) => d
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| ReplacerError::Decryption(e.to_string()))?,
        _ => {
            return Err(ReplacerError::Decryption(
                "Secret was not encrypted to the store recipient".into(),
            ))
        }
    };
    read_all(reader)
}

/// Seal a store identity under a passphrase (one scrypt).
pub fn seal_identity(identity: &str, passphrase: &str) -> Result<Vec<u8>> {
    let encryptor =
        age::Encryptor::with_user_passphrase(age::secrecy::Secret::new(passphrase.to_string()));
    seal(encryptor, identity.as_bytes())
}

/// Recover a store identity sealed by [`seal_identity`].
pub fn unseal_identity(sealed: &[u8], passphrase: &str) -> Result<Zeroizing<String>> {
    let reader = match open(sealed)? {
        age::Decryptor::Passphrase(d) => d
            .decrypt(&age::secrecy::Secret::new(passphrase.to_string()), None)
            .map_err(|e| ReplacerError::Decryption(e.to_string()))?,
        _ => {
            return Err(ReplacerError::Decryption(
                "Store identity is not passphrase-sealed".into(),
            ))
        }
    };
    let bytes = read_all(reader)?;
    let identity = std::str::from_utf8(&bytes)
        .map_err(|_| ReplacerError::Decryption("Store identity is not valid UTF-8".into()))?;
    Ok(Zeroizing::new(identity.to_string()))
}

fn seal(encryptor: age::Encryptor, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut sealed = vec![];
    let mut writer = encryptor
        .wrap_output(&mut sealed)
        .map_err(|e| ReplacerError::Encryption(e.to_string()))?;
    writer
        .write_all(plaintext)
        .and_then(|_| writer.finish().map(|_| ()))
        .map_err(|e| ReplacerError::Encryption(e.to_string()))?;
    Ok(sealed)
}

fn open(ciphertext: &[u8]) -> Result<age::Decryptor<&[u8]>> {
    age::Decryptor::new(ciphertext).map_err(|e| ReplacerError::Decryption(e.to_string()))
}

fn read_all<R: Read>(mut reader: R) -> Result<Zeroizing<Vec<u8>>> {
    let mut plaintext = Zeroizing::new(vec![]);
    reader
        .read_to_end(&mut plaintext)
        .map_err(|e| ReplacerError::Decryption(e.to_string()))?;
    Ok(plaintext)
}

/// Derive a sub-key using HKDF-SHA256.
pub fn derive_key(master: &[u8], info: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(None, master);
    let mut okm = vec![0u8; output_len];
    hk.expand(info, &mut okm)
        .map_err(|e| ReplacerError::Encryption(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}

/// Derive the key that binds ciphertexts to their encryption context.
pub fn derive_binding_key(identity: &str) -> Result<Zeroizing<Vec<u8>>> {
    derive_key(identity.as_bytes(), b"context-binding", 32).map(Zeroizing::new)
}

/// HMAC over a stored secret's identity, its encryption context and its ciphertext.
pub fn binding_hmac(
    binding_key: &[u8],
    name: &str,
    version: u32,
    context: &EncryptionContext,
    ciphertext: &[u8],
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(binding_key)
        .map_err(|e| ReplacerError::Encryption(e.to_string()))?;
    mac.update(format!("{}:{}|{}|", name.len(), name, version).as_bytes());
    mac.update(&context::canonical_bytes(context));
    mac.update(b"|");
    mac.update(ciphertext);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a stored binding HMAC in constant time.
pub fn verify_binding(expected_hex: &str, actual_hex: &str) -> Result<bool> {
    let expected =
        hex::decode(expected_hex).map_err(|e| ReplacerError::Serialization(e.to_string()))?;
    let actual =
        hex::decode(actual_hex).map_err(|e| ReplacerError::Serialization(e.to_string()))?;
    Ok(expected.ct_eq(&actual).into())
}

/// Generate a new age keypair. Returns (secret_key_string, public_key_string).
pub fn generate_keypair() -> (String, String) {
    let identity = age::x25519::Identity::generate();
    let secret_key = identity.to_string();
    let public_key = identity.to_public().to_string();
    (secret_key.expose_secret().clone(), public_key)
}

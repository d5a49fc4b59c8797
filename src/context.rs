//! Encryption context handling.
//!
//! The context is an opaque string mapping handed to the store on every fetch.
//! It arrives on the command line as `KEY=VALUE` tokens.

use std::collections::BTreeMap;

use crate::error::{ReplacerError, Result};

pub type EncryptionContext = BTreeMap<String, String>;

/// Split a single `KEY=VALUE` token on its first `=`.
pub fn parse_pair(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ReplacerError::InvalidContextPair(arg.to_string())),
    }
}

/// Build a context from `KEY=VALUE` tokens. A repeated key keeps its last value.
pub fn from_args<I, S>(args: I) -> Result<EncryptionContext>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut context = EncryptionContext::new();
    for arg in args {
        let (key, value) = parse_pair(arg.as_ref())?;
        context.insert(key, value);
    }
    Ok(context)
}

/// Unambiguous byte encoding of a context, used when binding it to stored ciphertext.
pub fn canonical_bytes(context: &EncryptionContext) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in context {
        out.extend_from_slice(format!("{}:{}={}:{};", key.len(), key, value.len(), value).as_bytes());
    }
    out
}

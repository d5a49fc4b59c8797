//! credentials-replacer: render a template with secrets from an encrypted regional store.
//!
//! Every secret visible in a region is fetched under the caller's encryption context
//! and exposed to the template under its own name. The CLI is gated behind the `cli`
//! feature and is private to the binary.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use credentials_replacer::auth;
//! use credentials_replacer::config::Config;
//! use credentials_replacer::context::EncryptionContext;
//! use credentials_replacer::render::Renderer;
//! use credentials_replacer::store::VaultStore;
//!
//! let config = Config::load_default()?;
//! let store = VaultStore::new(config.store_dir(), auth::resolve_key(&config)?);
//! let output = Renderer::new(&store).render(
//!     Path::new("app.conf.j2"),
//!     "us-east-1",
//!     &EncryptionContext::new(),
//!     true,
//! )?;
//! print!("{}", output);
//! # Ok::<(), credentials_replacer::error::ReplacerError>(())
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod render;
pub mod store;
pub mod types;

//! Common re-exports shared by the store modules.

pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use std::collections::BTreeMap;
pub use std::path::{Path, PathBuf};

//! Template rendering against the secrets of a region.
//!
//! [`Renderer::render`] lists every secret in the region, fetches each value under
//! the caller's encryption context and renders one template file with the result.
//! Either the whole template renders or an error is returned; there is no partial
//! output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use minijinja::value::{Object, Value};
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use tracing::debug;

use crate::context::EncryptionContext;
use crate::error::{ReplacerError, Result};
use crate::store::{SecretMap, SecretStore};

/// Functions minijinja registers as globals; never reported as missing secrets.
const BUILTIN_GLOBALS: &[&str] = &["range", "dict", "debug", "namespace"];

/// A template file read into memory, with the directory includes resolve against.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub name: String,
    pub root: PathBuf,
    pub source: String,
}

impl TemplateSource {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| ReplacerError::TemplateAccess {
            path: path.display().to_string(),
            source: e,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self { name, root, source })
    }

    /// Render against `secrets`. In strict mode a variable with no value is an error.
    ///
    /// The strict-mode error names the variable whose evaluation failed, including one
    /// inside an included template. Names that are only tested (`is defined`) or sit
    /// in branches that never run are not reported.
    pub fn render(&self, secrets: &SecretMap, strict: bool) -> Result<String> {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&self.root));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(if strict {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });

        env.add_template_owned(self.name.clone(), self.source.clone())
            .map_err(template_error)?;
        let template = env.get_template(&self.name).map_err(template_error)?;

        let ctx = Value::from_object(SecretContext::new(secrets.clone()));
        let err = match template.render(&ctx) {
            Ok(output) => return Ok(output),
            Err(err) => err,
        };
        if strict {
            if let Some(cause) = undefined_cause(&err) {
                let missing = ctx
                    .downcast_object_ref::<SecretContext>()
                    .and_then(SecretContext::last_miss)
                    .unwrap_or_else(|| cause.to_string());
                return Err(ReplacerError::UndefinedVariable(missing));
            }
        }
        Err(template_error(err))
    }
}

/// Root render context: the secret mapping, remembering the last top-level name looked up.
#[derive(Debug)]
struct SecretContext {
    secrets: SecretMap,
    last_lookup: Mutex<Option<(String, bool)>>,
}

impl SecretContext {
    fn new(secrets: SecretMap) -> Self {
        Self {
            secrets,
            last_lookup: Mutex::new(None),
        }
    }

    /// The most recently looked-up name, if that lookup found nothing.
    ///
    /// A strict-mode failure stops rendering at the first undefined value used, so a
    /// failed lookup that came last is the variable that failed. If the last lookup
    /// succeeded the failure was elsewhere (e.g. a missing attribute).
    fn last_miss(&self) -> Option<String> {
        match self.last_lookup.lock().ok()?.clone() {
            Some((name, false)) => Some(name),
            _ => None,
        }
    }
}

impl Object for SecretContext {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        let value = self.secrets.get(name).map(Value::from);
        if !BUILTIN_GLOBALS.contains(&name) {
            let mut last = self
                .last_lookup
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *last = Some((name.to_string(), value.is_some()));
        }
        value
    }
}

/// The undefined-value error behind `err`, looking through include wrappers.
fn undefined_cause(err: &minijinja::Error) -> Option<&minijinja::Error> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(e) = e.downcast_ref::<minijinja::Error>() {
            if e.kind() == ErrorKind::UndefinedError {
                return Some(e);
            }
        }
        current = e.source();
    }
    None
}

fn template_error(err: minijinja::Error) -> ReplacerError {
    match err.kind() {
        ErrorKind::SyntaxError => ReplacerError::TemplateSyntax(err.to_string()),
        _ => ReplacerError::TemplateRender(err.to_string()),
    }
}

/// Render a template file against an already-fetched secret mapping.
pub fn render_template(path: &Path, secrets: &SecretMap, strict: bool) -> Result<String> {
    TemplateSource::load(path)?.render(secrets, strict)
}

/// Fetch every secret visible in `region`, each under the same encryption context.
///
/// Fetches run one after another; the first failure aborts.
pub fn fetch_secrets(
    store: &dyn SecretStore,
    region: &str,
    context: &EncryptionContext,
) -> Result<SecretMap> {
    let refs = store.list_secrets(region)?;
    debug!(region, count = refs.len(), "listed secrets");

    let mut secrets = SecretMap::new();
    for secret in &refs {
        let value = store.get_secret(&secret.name, region, context)?;
        debug!(region, secret = %secret.name, version = secret.version, "fetched secret");
        secrets.insert(secret.name.clone(), value);
    }
    Ok(secrets)
}

/// Renders templates with secrets from a store.
pub struct Renderer<'a> {
    store: &'a dyn SecretStore,
}

impl<'a> Renderer<'a> {
    pub fn new(store: &'a dyn SecretStore) -> Self {
        Self { store }
    }

    /// Read the template, fetch every secret in `region`, render.
    pub fn render(
        &self,
        template_path: &Path,
        region: &str,
        context: &EncryptionContext,
        strict: bool,
    ) -> Result<String> {
        let template = TemplateSource::load(template_path)?;
        let secrets = fetch_secrets(self.store, region, context)?;

        debug!(
            template = %template_path.display(),
            secrets = secrets.len(),
            strict,
            "rendering template"
        );
        template.render(&secrets, strict)
    }
}

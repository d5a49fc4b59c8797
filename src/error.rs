use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplacerError {
    #[error("Invalid encryption context argument '{0}': expected KEY=VALUE")]
    InvalidContextPair(String),

    #[error("Invalid region '{0}': use letters, digits, '-' or '_'")]
    InvalidRegion(String),

    #[error("Invalid secret name '{0}'")]
    InvalidSecretName(String),

    #[error("Cannot read template '{path}': {source}")]
    TemplateAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Template syntax error: {0}")]
    TemplateSyntax(String),

    #[error("Template render error: {0}")]
    TemplateRender(String),

    #[error("Undefined template variable: {0}")]
    UndefinedVariable(String),

    #[error("No credential store for region '{region}' at {path}")]
    StoreUnavailable { region: String, path: String },

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Invalid keyfile: {0}")]
    InvalidKeyfile(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Decryption of secret '{0}' failed: encryption context does not match")]
    ContextMismatch(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    FileAccess,
    TemplateSyntax,
    UndefinedVariable,
    Store,
    Internal,
}

impl ReplacerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReplacerError::InvalidContextPair(_)
            | ReplacerError::InvalidRegion(_)
            | ReplacerError::InvalidSecretName(_) => ErrorCategory::Input,
            ReplacerError::TemplateAccess { .. } => ErrorCategory::FileAccess,
            ReplacerError::TemplateSyntax(_) | ReplacerError::TemplateRender(_) => {
                ErrorCategory::TemplateSyntax
            }
            ReplacerError::UndefinedVariable(_) => ErrorCategory::UndefinedVariable,
            ReplacerError::StoreUnavailable { .. }
            | ReplacerError::SecretNotFound(_)
            | ReplacerError::AuthFailed(_)
            | ReplacerError::InvalidKeyfile(_)
            | ReplacerError::Decryption(_)
            | ReplacerError::ContextMismatch(_) => ErrorCategory::Store,
            ReplacerError::Encryption(_)
            | ReplacerError::Serialization(_)
            | ReplacerError::Config(_)
            | ReplacerError::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Return a typed exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplacerError::InvalidContextPair(_) => 2,
            ReplacerError::InvalidRegion(_) => 2,
            ReplacerError::InvalidSecretName(_) => 2,
            ReplacerError::TemplateAccess { .. } => 3,
            ReplacerError::TemplateSyntax(_) => 4,
            ReplacerError::TemplateRender(_) => 4,
            ReplacerError::UndefinedVariable(_) => 5,
            ReplacerError::StoreUnavailable { .. } => 6,
            ReplacerError::SecretNotFound(_) => 6,
            ReplacerError::AuthFailed(_) => 7,
            ReplacerError::InvalidKeyfile(_) => 7,
            ReplacerError::Decryption(_) => 8,
            ReplacerError::ContextMismatch(_) => 8,
            ReplacerError::Encryption(_) => 1,
            ReplacerError::Serialization(_) => 1,
            ReplacerError::Config(_) => 1,
            ReplacerError::Io(_) => 1,
        }
    }

    /// Return a string error code identifier.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReplacerError::InvalidContextPair(_) => "invalid_context",
            ReplacerError::InvalidRegion(_) => "invalid_region",
            ReplacerError::InvalidSecretName(_) => "invalid_secret_name",
            ReplacerError::TemplateAccess { .. } => "template_access",
            ReplacerError::TemplateSyntax(_) => "template_syntax",
            ReplacerError::TemplateRender(_) => "template_render",
            ReplacerError::UndefinedVariable(_) => "undefined_variable",
            ReplacerError::StoreUnavailable { .. } => "store_unavailable",
            ReplacerError::SecretNotFound(_) => "not_found",
            ReplacerError::AuthFailed(_) => "auth_failed",
            ReplacerError::InvalidKeyfile(_) => "invalid_keyfile",
            ReplacerError::Decryption(_) => "decryption_error",
            ReplacerError::ContextMismatch(_) => "context_mismatch",
            ReplacerError::Encryption(_) => "encryption_error",
            ReplacerError::Serialization(_) => "serialization_error",
            ReplacerError::Config(_) => "config_error",
            ReplacerError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplacerError>;

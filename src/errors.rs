use thiserror::Error;

/// Errors raised while rewriting a registry.
///
/// All of them are raised before the registry is touched, so a failed call
/// leaves the collection exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No service of type {service} has been registered")]
    NotFound { service: &'static str },
}

impl RegistryError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        RegistryError::InvalidArgument(reason.into())
    }

    pub fn not_found(service: &'static str) -> Self {
        RegistryError::NotFound { service }
    }

    /// 记录错误到日志
    pub fn log(&self, operation: &str) {
        tracing::warn!(error = %self, operation, "Registry rewrite rejected");
    }
}

/// Errors raised at resolution time, by the engine or by the factories this crate builds.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Service '{service}' is not registered")]
    NotRegistered { service: &'static str },
    #[error("Type cast failed: expected '{expected}', found '{actual}'")]
    TypeCastFailed {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Missing constructor argument of type '{argument}'")]
    MissingArgument { argument: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum DiError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

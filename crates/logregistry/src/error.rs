use thiserror::Error;

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("logger '{0}' is already registered")]
    DuplicateName(String),
    #[error("no logger named '{0}' is registered")]
    UnknownName(String),
    #[error("invalid registry configuration: {0}")]
    ConfigError(String),
}

impl From<logpool::PoolError> for RegistryError {
    fn from(err: logpool::PoolError) -> Self {
        match err {
            logpool::PoolError::ConfigError(msg) => RegistryError::ConfigError(msg),
            logpool::PoolError::PoolGone | logpool::PoolError::FlushSignalLost => {
                RegistryError::ConfigError(err.to_string())
            }
        }
    }
}

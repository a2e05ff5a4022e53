use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Handler '{0}' is not registered")]
    HandlerNotFound(String),

    #[error("Handler '{handler}' failed: {source}")]
    HandlerExecution {
        handler: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, HookError>;

impl<T> From<std::sync::PoisonError<T>> for HookError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

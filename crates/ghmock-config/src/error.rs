//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but is unreadable, not JSON, or has mistyped
    /// review keys.
    #[error("invalid config file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: figment::Error,
    },

    /// An environment variable holds a value of the wrong shape.
    #[error("invalid value for {name}: {source}")]
    InvalidEnv {
        name: String,
        #[source]
        source: figment::Error,
    },
}

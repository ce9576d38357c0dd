use std::path::PathBuf;

use baw_core::{ApiError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("a task id is required")]
    MissingTaskId,

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid profile '{profile}': {message}")]
    InvalidProfile { profile: String, message: String },

    #[error("Unknown node '{0}' (expected 'profile')")]
    UnknownNode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

//! Error type for rork-common
//!
//! Only config file loading can fail here; the time helpers return `Option`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rork-common operations
pub type Result<T> = std::result::Result<T, Error>;

/// Config file loading errors
#[derive(Error, Debug)]
pub enum Error {
    /// Config file exists but could not be read
    #[error("Config file {} unreadable: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the target type
    #[error("Config file {} malformed: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    /// Path of the config file that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::ConfigRead { path, .. } | Error::ConfigParse { path, .. } => path,
        }
    }
}

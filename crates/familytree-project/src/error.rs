use familytree_core::HierarchyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid family document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid family hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("No config directory available on this platform")]
    NoConfigDir,
    #[error("Settings IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("Outline IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize outline: {0}")]
    Serialize(#[from] serde_json::Error),
}

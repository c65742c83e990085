//! Errors raised while building a scene from a description file.

use snapto_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Scene loading failures.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The file could not be read.
    #[error("failed to read scene {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for a scene.
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    /// A node names a parent that was not declared before it.
    #[error("node `{node}` refers to unknown parent `{parent}`")]
    UnknownParent {
        /// Child node label.
        node: String,
        /// Missing parent name.
        parent: String,
    },
    /// Two nodes share a name.
    #[error("duplicate node name `{0}`")]
    DuplicateName(String),
    /// A node's snap attribute could not be parsed.
    #[error("node `{node}` has an invalid snapto attribute: {source}")]
    Snap {
        /// Node label.
        node: String,
        /// Underlying option error.
        #[source]
        source: ConfigError,
    },
}

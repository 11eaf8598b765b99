use thiserror::Error;

use crate::core::types::Position;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Position {position} is outside the {width}x{height} grid")]
    OutOfBounds {
        position: Position,
        width: u32,
        height: u32,
    },

    #[error("Allocation failed to normalize: {0}")]
    Allocation(String),

    #[error("Derived index diverged from authoritative state: {0}")]
    DataIntegrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

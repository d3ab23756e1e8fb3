use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::ids::{MoleculeId, StrandId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Molecule not found in model: {id:?}")]
    MoleculeNotFound { id: MoleculeId },

    #[error("Strand not found in model: {id:?}")]
    StrandNotFound { id: StrandId },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

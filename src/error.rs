//! Error taxonomy shared by the wallet, the store backends and the discovery engine.

use crate::keys::path::PathError;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Stored or supplied derivation path could not be parsed.
    #[error("Wrong path format: {0}")]
    Format(#[from] PathError),
    /// No derivation path was ever registered for this address.
    #[error("Address {0} private key not found")]
    NotFound(String),
    #[error("Persistence read failed: {0}")]
    PersistenceRead(String),
    #[error("Persistence write failed: {0}")]
    PersistenceWrite(String),
    #[error("Activity oracle: {0}")]
    Oracle(String),
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
    #[error("Key derivation: {0}")]
    Derivation(String),
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Discovery already in progress")]
    DiscoveryInProgress,
    #[error("Startup aborted: {0}")]
    Startup(String),
}

impl WalletError {
    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }

    pub fn read(msg: impl std::fmt::Display) -> Self {
        Self::PersistenceRead(msg.to_string())
    }

    pub fn write(msg: impl std::fmt::Display) -> Self {
        Self::PersistenceWrite(msg.to_string())
    }
}

impl From<bitcoin::bip32::Error> for WalletError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        Self::Derivation(e.to_string())
    }
}

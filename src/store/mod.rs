//! Store - async key-value persistence with a remote and a local backend.
//!
//! ```text
//! StoreBackend::select(config)
//!     │
//!     ├── Redis connect ok  → Remote (for the wallet's lifetime)
//!     │
//!     └── connect error     → Local (JSON file, never retried)
//! ```
//!
//! `set` is awaitable and returns its outcome. The wallet treats registration writes as
//! fire-and-forget: a failed write is logged and the address is still handed out.

mod local;
#[cfg(feature = "remote-store")]
mod remote;

pub use local::LocalStore;
#[cfg(feature = "remote-store")]
pub use remote::RemoteStore;

use crate::config::WalletConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Backend picked once at startup.
pub enum StoreBackend {
    #[cfg(feature = "remote-store")]
    Remote(RemoteStore),
    Local(LocalStore),
}

impl StoreBackend {
    /// Single connect attempt against the remote store; any failure selects the local store.
    pub async fn select(config: &WalletConfig) -> Result<Self> {
        #[cfg(feature = "remote-store")]
        {
            match RemoteStore::connect(&config.storage_url(), config.storage_connect_timeout).await {
                Ok(remote) => {
                    info!(url = %config.storage_url(), "Using remote store");
                    return Ok(StoreBackend::Remote(remote));
                }
                Err(e) => warn!(error = %e, "Remote store unavailable, falling back to local store"),
            }
        }

        let path = config.local_store_path();
        let local = LocalStore::open(&path).await?;
        info!(path = %path.display(), "Using local store");
        Ok(StoreBackend::Local(local))
    }

    pub fn is_remote(&self) -> bool {
        match self {
            #[cfg(feature = "remote-store")]
            StoreBackend::Remote(_) => true,
            StoreBackend::Local(_) => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.is_remote() { "remote" } else { "local" }
    }
}

#[async_trait]
impl KeyValueStore for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            #[cfg(feature = "remote-store")]
            StoreBackend::Remote(s) => s.get(key).await,
            StoreBackend::Local(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            #[cfg(feature = "remote-store")]
            StoreBackend::Remote(s) => s.set(key, value).await,
            StoreBackend::Local(s) => s.set(key, value).await,
        }
    }
}

//! Wallet configuration - built by the caller or loaded from the environment.

use crate::error::{Result, WalletError};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const MAINNET_ORACLE_HOST: &str = "https://engine.colu.co";
pub const TESTNET_ORACLE_HOST: &str = "https://testnet.engine.colu.co";
pub const DEFAULT_STORAGE_HOST: &str = "127.0.0.1";
pub const DEFAULT_STORAGE_PORT: u16 = 6379;

const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const APP_DIR: &str = "hdwallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    pub fn to_bitcoin(&self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
        }
    }

    pub fn default_oracle_host(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_ORACLE_HOST,
            Network::Testnet => TESTNET_ORACLE_HOST,
        }
    }
}

impl FromStr for Network {
    type Err = WalletError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            _ => Err(WalletError::Config(format!("unknown network {:?}", value))),
        }
    }
}

/// Wallet construction parameters.
#[derive(Clone)]
pub struct WalletConfig {
    pub network: Network,
    /// Hex seed. `None` generates a fresh seed and skips discovery.
    pub seed: Option<String>,
    pub oracle_host: Option<String>,
    pub oracle_timeout: Duration,
    pub storage_host: String,
    pub storage_port: u16,
    pub storage_connect_timeout: Duration,
    /// Where the local store keeps its file when the remote store is unreachable.
    pub data_dir: Option<PathBuf>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            seed: None,
            oracle_host: None,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            storage_host: DEFAULT_STORAGE_HOST.into(),
            storage_port: DEFAULT_STORAGE_PORT,
            storage_connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            data_dir: None,
        }
    }
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("network", &self.network)
            .field("seed", &self.seed.as_ref().map(|_| "<redacted>"))
            .field("oracle_host", &self.oracle_host())
            .field("storage", &self.storage_url())
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl WalletConfig {
    pub fn new(network: Network) -> Self { Self { network, ..Default::default() } }
    pub fn mainnet() -> Self { Self::new(Network::Mainnet) }
    pub fn testnet() -> Self { Self::new(Network::Testnet) }
    pub fn with_seed(mut self, seed_hex: impl Into<String>) -> Self { self.seed = Some(seed_hex.into()); self }
    pub fn with_oracle_host(mut self, host: impl Into<String>) -> Self { self.oracle_host = Some(host.into()); self }
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self { self.oracle_timeout = timeout; self }
    pub fn with_storage(mut self, host: impl Into<String>, port: u16) -> Self { self.storage_host = host.into(); self.storage_port = port; self }
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self { self.storage_connect_timeout = timeout; self }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = Some(path.into()); self }

    /// Read `HDWALLET_*` variables, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let network = match std::env::var("HDWALLET_NETWORK") {
            Ok(value) => value.parse()?,
            Err(_) => Network::default(),
        };
        let mut config = Self::new(network);
        config.seed = non_empty_var("HDWALLET_SEED");
        config.oracle_host = non_empty_var("HDWALLET_ORACLE_HOST");
        if let Some(host) = non_empty_var("HDWALLET_STORAGE_HOST") {
            config.storage_host = host;
        }
        if let Some(port) = non_empty_var("HDWALLET_STORAGE_PORT") {
            config.storage_port = port
                .parse()
                .map_err(|_| WalletError::Config(format!("invalid storage port {:?}", port)))?;
        }
        config.data_dir = non_empty_var("HDWALLET_DATA_DIR").map(PathBuf::from);
        Ok(config)
    }

    pub fn oracle_host(&self) -> &str {
        self.oracle_host.as_deref().unwrap_or(self.network.default_oracle_host())
    }

    pub fn storage_url(&self) -> String {
        format!("redis://{}:{}/", self.storage_host, self.storage_port)
    }

    /// Local store file. Falls back to the platform data dir.
    pub fn local_store_path(&self) -> PathBuf {
        let root = self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        });
        root.join("store.json")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

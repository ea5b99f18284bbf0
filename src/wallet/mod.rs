//! Wallet - the facade over seed, store, oracle and discovery.
//!
//! # Startup
//!
//! ```text
//! Wallet::open(config)
//!     │
//!     ├── SeedManager   (supplied hex seed, or fresh random seed)
//!     ├── StoreBackend  (remote if reachable, else local; decided once)
//!     ├── HttpOracle
//!     │
//!     └── seed supplied? → DiscoveryEngine::discover() → ready
//! ```
//!
//! `Wallet::start` runs the same sequence on a tokio task and returns a [`Readiness`] handle.
//!
//! # Keys
//!
//! | Method | Description |
//! |--------|-------------|
//! | `get_private_key(None, i)` | Claims the next free account, pre-registers its first addresses |
//! | `get_private_key(Some(a), i)` | Key at `m/44'/0'/a'/0/i` |
//! | `get_public_key` / `get_address` | Same derivation, recorded in the session key index |
//! | `get_address_private_key(addr)` | Rederives from the persisted path |

use crate::config::{Network, WalletConfig};
use crate::discovery::{DiscoveryEngine, DiscoveryReport, GAP_LIMIT_ADDRESSES};
use crate::error::{Result, WalletError};
use crate::keys::{path, Chain, KeyNode, SeedManager};
use crate::keyspace::Keyspace;
use crate::oracle::{ActivityOracle, HttpOracle};
use crate::registry::Registry;
use crate::runtime::Readiness;
use crate::store::{KeyValueStore, StoreBackend};
use bitcoin::{PrivateKey, PublicKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Where a handed-out public key sits in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLocation {
    pub account: u32,
    pub address_index: u32,
}

pub struct Wallet {
    seeds: Arc<SeedManager>,
    registry: Registry,
    engine: DiscoveryEngine,
    needs_discovery: AtomicBool,
    key_index: Mutex<HashMap<String, KeyLocation>>,
    addresses: Mutex<Vec<String>>,
}

impl Wallet {
    /// Build every collaborator from `config`, then discover if the seed was supplied.
    pub async fn open(config: WalletConfig) -> Result<Self> {
        let (seeds, needs_discovery) = match config.seed.as_deref() {
            Some(seed_hex) => (SeedManager::from_hex(seed_hex, config.network)?, true),
            None => (SeedManager::generate(config.network)?, false),
        };
        let backend = StoreBackend::select(&config).await?;
        let oracle = HttpOracle::new(config.oracle_host(), config.oracle_timeout)?;
        info!(
            network = config.network.as_str(),
            store = backend.kind(),
            oracle = oracle.endpoint(),
            needs_discovery,
            "Wallet opened"
        );

        let wallet = Self::from_parts(seeds, Arc::new(backend), Arc::new(oracle), needs_discovery);
        wallet.initialize().await?;
        Ok(wallet)
    }

    /// `open` in the background. The handle resolves once, to ready or failed.
    pub fn start(config: WalletConfig) -> Readiness<Wallet> {
        Readiness::spawn(Self::open(config))
    }

    /// Assemble a wallet from already-chosen collaborators. Runs no I/O.
    pub fn from_parts(
        seeds: SeedManager,
        store: Arc<dyn KeyValueStore>,
        oracle: Arc<dyn ActivityOracle>,
        needs_discovery: bool,
    ) -> Self {
        let seeds = Arc::new(seeds);
        let registry = Registry::new(store, Keyspace::new(seeds.fingerprint()));
        let engine = DiscoveryEngine::new(seeds.clone(), registry.clone(), oracle);
        Self {
            seeds,
            registry,
            engine,
            needs_discovery: AtomicBool::new(needs_discovery),
            key_index: Mutex::new(HashMap::new()),
            addresses: Mutex::new(Vec::new()),
        }
    }

    /// Discover once if this wallet was built from an existing seed, otherwise load the counter.
    pub async fn initialize(&self) -> Result<()> {
        if self.needs_discovery() {
            self.discover().await?;
        } else {
            self.registry.next_account().await?;
        }
        Ok(())
    }

    /// Run a discovery pass. Safe to call again after a failure; it resumes from the persisted counter.
    pub async fn discover(&self) -> Result<DiscoveryReport> {
        let report = self.engine.discover().await?;
        self.needs_discovery.store(false, Ordering::SeqCst);
        for address in &report.active_addresses {
            self.remember_address(address);
        }
        Ok(report)
    }

    pub fn needs_discovery(&self) -> bool {
        self.needs_discovery.load(Ordering::SeqCst)
    }

    pub fn network(&self) -> Network {
        self.seeds.network()
    }

    pub fn private_seed(&self) -> String {
        self.seeds.seed_hex()
    }

    pub fn fingerprint(&self) -> String {
        self.seeds.fingerprint()
    }

    /// Lowest account `get_private_key(None, ..)` may assign, as last seen in the store.
    pub fn next_account(&self) -> u32 {
        self.registry.known_next_account()
    }

    /// Extended public key of `account`, `xpub…` on mainnet and `tpub…` on testnet.
    pub fn account_xpub(&self, account: u32) -> Result<String> {
        Ok(self.seeds.account_xpub(account)?.to_string())
    }

    pub async fn get_private_key(&self, account: Option<u32>, address_index: u32) -> Result<PrivateKey> {
        let (_, node) = self.derive(account, address_index).await?;
        Ok(node.private_key)
    }

    pub async fn get_public_key(&self, account: Option<u32>, address_index: u32) -> Result<PublicKey> {
        let (account, node) = self.derive(account, address_index).await?;
        self.index_key(account, address_index, &node);
        Ok(node.public_key)
    }

    pub async fn get_address(&self, account: Option<u32>, address_index: u32) -> Result<String> {
        let (account, node) = self.derive(account, address_index).await?;
        self.index_key(account, address_index, &node);
        Ok(node.address.to_string())
    }

    /// Persist `address → path` and wait for the store to acknowledge it.
    pub async fn register_address(&self, address: &str, account: u32, address_index: u32, change: bool) -> Result<()> {
        self.registry
            .register(address, &path::encode(account, Chain::from(change), address_index))
            .await
    }

    /// Private key of a previously registered address.
    pub async fn get_address_private_key(&self, address: &str) -> Result<PrivateKey> {
        let stored = self
            .registry
            .lookup(address)
            .await?
            .ok_or_else(|| WalletError::NotFound(address.to_string()))?;
        Ok(self.seeds.derive_from_path(&stored)?.private_key)
    }

    /// Addresses known this session: active ones found by discovery, then those handed out.
    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn key_location(&self, public_key_hex: &str) -> Option<KeyLocation> {
        self.key_index.lock().unwrap_or_else(|p| p.into_inner()).get(public_key_hex).copied()
    }

    async fn derive(&self, account: Option<u32>, address_index: u32) -> Result<(u32, KeyNode)> {
        let account = match account {
            Some(account) => account,
            None => self.claim_account().await?,
        };
        let node = self.seeds.derive_node(account, address_index)?;
        self.registry.remember(&node.address.to_string(), &node.path.to_string()).await;
        Ok((account, node))
    }

    /// Take the next account, persist the advanced counter and pre-register its first addresses.
    async fn claim_account(&self) -> Result<u32> {
        let account = self.registry.claim_account().await;
        for index in 0..GAP_LIMIT_ADDRESSES {
            let node = self.seeds.derive_node(account, index)?;
            self.registry.remember(&node.address.to_string(), &node.path.to_string()).await;
        }
        info!(account, "Assigned fresh account");
        Ok(account)
    }

    fn index_key(&self, account: u32, address_index: u32, node: &KeyNode) {
        self.key_index
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(node.public_key_hex(), KeyLocation { account, address_index });
        self.remember_address(&node.address.to_string());
        debug!(account, address_index, address = %node.address, "Key handed out");
    }

    fn remember_address(&self, address: &str) {
        let mut addresses = self.addresses.lock().unwrap_or_else(|p| p.into_inner());
        if !addresses.iter().any(|a| a == address) {
            addresses.push(address.to_string());
        }
    }
}

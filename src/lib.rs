//! hdwallet: BIP44 hierarchical-deterministic wallet with activity-driven discovery.
//!
//! # Architecture
//!
//! ```text
//! Wallet (entry point)
//!   │
//!   ├── SeedManager (32-byte seed → master key → m/44'/0'/a'/c/i)
//!   │
//!   ├── Registry (fingerprint-namespaced keys)
//!   │     └── StoreBackend
//!   │           ├── RemoteStore (redis, when reachable at startup)
//!   │           └── LocalStore  (JSON file under the data dir)
//!   │
//!   └── DiscoveryEngine
//!         └── ActivityOracle → HttpOracle (POST /is_addresses_active)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | start | `Wallet::start(config)` | Open in the background, await `Readiness` |
//! | derive | `wallet.get_address(account, i)` | Address at the BIP44 path, registered as a side effect |
//! | register | `wallet.register_address(..)` | Persist `address → path`, awaiting the write |
//! | recover | `wallet.get_address_private_key(addr)` | Private key from the persisted path |
//! | discover | `wallet.discover()` | Gap-limited scan over accounts and addresses |
//!
//! # Features
//!
//! - `remote-store` - Redis-backed key-value store (default). Without it the wallet always uses the local file.
//!
//! # Usage
//!
//! ```ignore
//! use hdwallet::{Wallet, WalletConfig};
//!
//! let wallet = Wallet::start(
//!     WalletConfig::testnet()
//!         .with_seed("ff92aaece15f7b179796f0b849ca69a869f1f043a45b1e4ba821f20db25a52c8")
//!         .with_storage("127.0.0.1", 6379),
//! )
//! .wait()
//! .await?;
//!
//! let address = wallet.get_address(Some(0), 0).await?;
//! let key = wallet.get_address_private_key(&address).await?;
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod keys;
pub mod keyspace;
pub mod logging;
pub mod oracle;
pub mod registry;
pub mod runtime;
pub mod store;
pub mod wallet;

// =============================================================================
// Re-exports
// =============================================================================
pub use config::{Network, WalletConfig};
pub use discovery::{DiscoveryEngine, DiscoveryReport, BATCH_SIZE, GAP_LIMIT_ACCOUNTS, GAP_LIMIT_ADDRESSES};
pub use error::{Result, WalletError};
pub use keys::{Chain, DerivationPath, KeyNode, PathError, SeedManager};
pub use keyspace::Keyspace;
pub use logging::init_logging;
pub use oracle::{ActivityOracle, HttpOracle};
pub use registry::Registry;
pub use runtime::Readiness;
pub use store::{KeyValueStore, LocalStore, StoreBackend};
pub use wallet::{KeyLocation, Wallet};

//! Registry - typed view of the store: address records and the next-account counter.
//!
//! The counter only moves forward. Every counter write goes through one lock per wallet and
//! never stores a value below what is already persisted.

use crate::error::{Result, WalletError};
use crate::keyspace::Keyspace;
use crate::store::KeyValueStore;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn KeyValueStore>,
    keys: Keyspace,
    counter_lock: Arc<Mutex<()>>,
    /// Highest counter value seen or written by this process.
    known_next: Arc<AtomicU32>,
}

impl Registry {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: Keyspace) -> Self {
        Self {
            store,
            keys,
            counter_lock: Arc::new(Mutex::new(())),
            known_next: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keys
    }

    /// Persisted next account, 0 when never written.
    pub async fn next_account(&self) -> Result<u32> {
        let stored = match self.store.get(&self.keys.next_account()).await? {
            None => 0,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| WalletError::read(format!("corrupt next account {:?}", raw)))?,
        };
        self.known_next.fetch_max(stored, Ordering::SeqCst);
        Ok(stored)
    }

    /// Next account as far as this process knows, without touching the store.
    pub fn known_next_account(&self) -> u32 {
        self.known_next.load(Ordering::SeqCst)
    }

    /// Raise the persisted counter to `at_least`. A lower value leaves it untouched.
    /// Returns the counter after the update.
    pub async fn raise_next_account(&self, at_least: u32) -> Result<u32> {
        let _guard = self.counter_lock.lock().await;
        let stored = self.next_account().await?;
        self.known_next.fetch_max(at_least, Ordering::SeqCst);
        if at_least <= stored {
            return Ok(stored);
        }
        self.write_next_account(at_least).await?;
        Ok(at_least)
    }

    /// Reserve the next free account and persist the counter past it.
    ///
    /// The account is the larger of the persisted counter and the in-process one, so a failed
    /// read or write never hands the same account out twice within this process.
    pub async fn claim_account(&self) -> u32 {
        let _guard = self.counter_lock.lock().await;
        let stored = match self.next_account().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Next account unreadable, using in-process counter");
                0
            }
        };
        let account = stored.max(self.known_next.load(Ordering::SeqCst));
        self.known_next.fetch_max(account + 1, Ordering::SeqCst);
        if let Err(e) = self.write_next_account(account + 1).await {
            warn!(account, error = %e, "Next account not persisted");
        }
        account
    }

    async fn write_next_account(&self, account: u32) -> Result<()> {
        self.store.set(&self.keys.next_account(), &account.to_string()).await
    }

    /// Write `address → path` and report the outcome.
    pub async fn register(&self, address: &str, path: &str) -> Result<()> {
        self.store.set(&self.keys.address(address), path).await
    }

    pub async fn lookup(&self, address: &str) -> Result<Option<String>> {
        self.store.get(&self.keys.address(address)).await
    }

    /// Fire-and-forget registration: a lost write only costs a later path lookup.
    pub async fn remember(&self, address: &str, path: &str) {
        if let Err(e) = self.register(address, path).await {
            warn!(address, path, error = %e, "Address registration not persisted");
        }
    }

    /// Fire-and-forget counter raise.
    pub async fn remember_next_account(&self, account: u32) {
        if let Err(e) = self.raise_next_account(account).await {
            warn!(account, error = %e, "Next account not persisted");
        }
    }
}

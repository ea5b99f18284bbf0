//! Discovery - recover which accounts and addresses a seed has used.
//!
//! Gap-limit scan, strictly sequential:
//!
//! ```text
//! discover()
//!   └── for account in next_account.. until GAP_LIMIT_ACCOUNTS empty accounts in a row
//!         └── discover_account(account)
//!               └── batches of BATCH_SIZE until GAP_LIMIT_ADDRESSES empty batches in a row
//!                     └── discover_address(account, start, BATCH_SIZE)
//!                           ├── derive + register each address
//!                           └── one oracle call for the batch
//! ```
//!
//! Emptiness is judged per batch: one active address anywhere in a batch resets the gap.

use crate::error::{Result, WalletError};
use crate::keys::SeedManager;
use crate::oracle::ActivityOracle;
use crate::registry::Registry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const GAP_LIMIT_ACCOUNTS: u32 = 3;
pub const GAP_LIMIT_ADDRESSES: u32 = 3;
pub const BATCH_SIZE: u32 = 4;

/// Result of scanning one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountScan {
    pub account: u32,
    pub addresses_scanned: u32,
    pub active_addresses: Vec<String>,
}

impl AccountScan {
    pub fn is_active(&self) -> bool {
        !self.active_addresses.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub start_account: u32,
    pub accounts_scanned: Vec<u32>,
    pub active_accounts: Vec<u32>,
    pub active_addresses: Vec<String>,
    /// Counter value persisted at the end of the run.
    pub next_account: u32,
}

pub struct DiscoveryEngine {
    seeds: Arc<SeedManager>,
    registry: Registry,
    oracle: Arc<dyn ActivityOracle>,
    running: AtomicBool,
}

/// Clears the in-flight flag however the scan ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WalletError::DiscoveryInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DiscoveryEngine {
    pub fn new(seeds: Arc<SeedManager>, registry: Registry, oracle: Arc<dyn ActivityOracle>) -> Self {
        Self { seeds, registry, oracle, running: AtomicBool::new(false) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Scan accounts from the persisted counter until `GAP_LIMIT_ACCOUNTS` empty ones in a row.
    pub async fn discover(&self) -> Result<DiscoveryReport> {
        let _in_flight = InFlight::acquire(&self.running)?;

        let start = self.registry.next_account().await?;
        info!(start_account = start, "Discovery started");

        let mut report = DiscoveryReport { start_account: start, next_account: start, ..Default::default() };
        let mut empty_accounts = 0;
        let mut account = start;

        while empty_accounts < GAP_LIMIT_ACCOUNTS {
            let scan = self.discover_account(account).await?;
            report.accounts_scanned.push(account);

            if scan.is_active() {
                empty_accounts = 0;
                report.next_account = account + 1;
                self.registry.remember_next_account(report.next_account).await;
                report.active_accounts.push(account);
                report.active_addresses.extend(scan.active_addresses);
            } else {
                empty_accounts += 1;
            }
            info!(account, active = report.active_accounts.last() == Some(&account), empty_accounts, "Account scanned");
            account += 1;
        }

        info!(
            scanned = report.accounts_scanned.len(),
            active = report.active_accounts.len(),
            next_account = report.next_account,
            "Discovery finished"
        );
        Ok(report)
    }

    /// Scan one account's receiving chain in batches until `GAP_LIMIT_ADDRESSES` empty batches in a row.
    pub async fn discover_account(&self, account: u32) -> Result<AccountScan> {
        let mut scan = AccountScan { account, ..Default::default() };
        let mut empty = 0;
        let mut cursor = 0;

        while empty < GAP_LIMIT_ADDRESSES {
            let batch = self.scan_batch(account, cursor, BATCH_SIZE).await?;
            cursor += BATCH_SIZE;
            scan.addresses_scanned += BATCH_SIZE;

            let before = scan.active_addresses.len();
            scan.active_addresses
                .extend(batch.into_iter().filter(|(_, active)| *active).map(|(address, _)| address));
            if scan.active_addresses.len() > before {
                empty = 0;
            } else {
                empty += 1;
            }
        }
        Ok(scan)
    }

    /// Derive and register `count` addresses from `start`, then ask the oracle about all of them.
    pub async fn discover_address(&self, account: u32, start: u32, count: u32) -> Result<Vec<bool>> {
        let batch = self.scan_batch(account, start, count).await?;
        Ok(batch.into_iter().map(|(_, active)| active).collect())
    }

    async fn scan_batch(&self, account: u32, start: u32, count: u32) -> Result<Vec<(String, bool)>> {
        let mut addresses = Vec::with_capacity(count as usize);
        for index in start..start + count {
            let node = self.seeds.derive_node(account, index)?;
            let address = node.address.to_string();
            // Registered before activity is known, so a handed-out address stays recoverable.
            self.registry.remember(&address, &node.path.to_string()).await;
            addresses.push(address);
        }

        let answers = self.oracle.is_active(&addresses).await?;
        if answers.len() != addresses.len() {
            return Err(WalletError::oracle(format!(
                "asked about {} addresses, got {} answers",
                addresses.len(),
                answers.len()
            )));
        }
        debug!(account, start, count, active = answers.iter().filter(|a| **a).count(), "Batch scanned");
        Ok(addresses.into_iter().zip(answers).collect())
    }
}

//! Persistence key layout.
//!
//! Every key lives under the wallet fingerprint:
//!
//! ```text
//! {sha256d(seed) hex}/{network}/coluSdkNextAccount  → "3"
//! {sha256d(seed) hex}/{network}/{address}           → "m/44'/0'/0'/0/0"
//! ```

/// Logical key of the next-account counter.
pub const NEXT_ACCOUNT: &str = "coluSdkNextAccount";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self { prefix: fingerprint.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_account(&self) -> String {
        self.key(NEXT_ACCOUNT)
    }

    pub fn address(&self, address: &str) -> String {
        self.key(address)
    }

    fn key(&self, logical: &str) -> String {
        format!("{}/{}", self.prefix, logical)
    }
}

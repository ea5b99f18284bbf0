//! Activity oracle - "has this address ever been used?", asked in batches.

mod http;

pub use http::{AddressActivity, HttpOracle, ACTIVE_PATH};

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ActivityOracle: Send + Sync {
    /// One answer per input address, in input order.
    async fn is_active(&self, addresses: &[String]) -> Result<Vec<bool>>;
}

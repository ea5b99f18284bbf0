//! Keys - BIP44 paths and seed-rooted derivation. The seed never leaves `SeedManager`.

pub mod path;
mod seed;

pub use path::{Chain, DerivationPath, PathError};
pub use seed::{KeyNode, SeedManager, SEED_LEN};

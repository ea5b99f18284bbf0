//! SeedManager - owns the master seed and derives BIP44 children from it.

use crate::config::Network;
use crate::error::{Result, WalletError};
use crate::keys::path::{self, Chain, DerivationPath};
use bitcoin::bip32::{ChildNumber, Xpriv, Xpub};
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{Address, PrivateKey, PublicKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

pub const SEED_LEN: usize = 32;

/// A derived key pair together with the path it came from.
#[derive(Debug, Clone)]
pub struct KeyNode {
    pub path: DerivationPath,
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyNode {
    pub fn public_key_hex(&self) -> String {
        self.public_key.to_string()
    }
}

pub struct SeedManager {
    seed: Zeroizing<[u8; SEED_LEN]>,
    network: Network,
    master: Xpriv,
    secp: Secp256k1<All>,
}

impl std::fmt::Debug for SeedManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedManager")
            .field("network", &self.network)
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

impl SeedManager {
    pub fn new(seed: [u8; SEED_LEN], network: Network) -> Result<Self> {
        let seed = Zeroizing::new(seed);
        let master = Xpriv::new_master(network.to_bitcoin(), seed.as_slice())?;
        Ok(Self { seed, network, master, secp: Secp256k1::new() })
    }

    /// Load a caller-supplied seed (64 hex chars).
    pub fn from_hex(seed_hex: &str, network: Network) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(seed_hex.trim()).map_err(|e| WalletError::InvalidSeed(e.to_string()))?,
        );
        let seed: [u8; SEED_LEN] = bytes.as_slice().try_into().map_err(|_| {
            WalletError::InvalidSeed(format!("expected {} bytes, got {}", SEED_LEN, bytes.len()))
        })?;
        Self::new(seed, network)
    }

    /// Fresh random seed from the OS RNG.
    pub fn generate(network: Network) -> Result<Self> {
        let mut seed = [0u8; SEED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::new(seed, network)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed.as_slice())
    }

    /// `hex(sha256(sha256(seed)))/<network>`. Namespaces everything persisted for this wallet.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(Sha256::digest(self.seed.as_slice()));
        format!("{}/{}", hex::encode(digest), self.network.as_str())
    }

    /// Receiving-chain key at `m/44'/0'/account'/0/address_index`.
    pub fn derive_node(&self, account: u32, address_index: u32) -> Result<KeyNode> {
        let path = DerivationPath::bip44(account, Chain::External, address_index)?;
        self.derive(path)
    }

    /// Replay an arbitrary stored path against the master node.
    pub fn derive_from_path(&self, path: &str) -> Result<KeyNode> {
        let path = path::decode(path)?;
        self.derive(path)
    }

    /// Extended public key of an account (`m/44'/0'/account'`).
    pub fn account_xpub(&self, account: u32) -> Result<Xpub> {
        let account_path = [
            ChildNumber::from_hardened_idx(path::PURPOSE)?,
            ChildNumber::from_hardened_idx(path::COIN_TYPE)?,
            ChildNumber::from_hardened_idx(account)?,
        ];
        let xprv = self.master.derive_priv(&self.secp, &account_path)?;
        Ok(Xpub::from_priv(&self.secp, &xprv))
    }

    fn derive(&self, path: DerivationPath) -> Result<KeyNode> {
        let xprv = self.master.derive_priv(&self.secp, &path.to_bip32())?;
        let private_key = xprv.to_priv();
        let public_key = PublicKey::new(Xpub::from_priv(&self.secp, &xprv).public_key);
        let address = Address::p2pkh(public_key.pubkey_hash(), self.network.to_bitcoin());
        Ok(KeyNode { path, private_key, public_key, address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "ff92aaece15f7b179796f0b849ca69a869f1f043a45b1e4ba821f20db25a52c8";
    const FIRST_TESTNET_ADDRESS: &str = "mgNcWJp4hPd7MN6ets2P8HcB5k99aCs8cy";

    #[test]
    fn test_golden_vector() {
        let seeds = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        let node = seeds.derive_node(0, 0).unwrap();
        assert_eq!(node.address.to_string(), FIRST_TESTNET_ADDRESS);
        assert_eq!(node.path.to_string(), "m/44'/0'/0'/0/0");
    }

    #[test]
    fn test_derivation_deterministic() {
        let a = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        let b = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        for (account, index) in [(0, 0), (0, 7), (3, 1), (12, 40)] {
            let x = a.derive_node(account, index).unwrap();
            let y = b.derive_node(account, index).unwrap();
            assert_eq!(x.address, y.address);
            assert_eq!(x.private_key, y.private_key);
        }
    }

    #[test]
    fn test_path_replay_matches_derive_node() {
        let seeds = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        for (account, index) in [(0, 0), (1, 5), (9, 2)] {
            let direct = seeds.derive_node(account, index).unwrap();
            let replayed = seeds
                .derive_from_path(&path::encode(account, Chain::External, index))
                .unwrap();
            assert_eq!(direct.address, replayed.address);
            assert_eq!(direct.private_key, replayed.private_key);
        }
    }

    #[test]
    fn test_derive_from_bad_path_fails() {
        let seeds = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        assert!(matches!(seeds.derive_from_path("44'/0'"), Err(WalletError::Format(_))));
        assert!(matches!(seeds.derive_from_path("m/44'/zero"), Err(WalletError::Format(_))));
    }

    #[test]
    fn test_network_selects_address_version() {
        let main = SeedManager::from_hex(SEED, Network::Mainnet).unwrap();
        let test = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        let main_addr = main.derive_node(0, 0).unwrap().address.to_string();
        let test_addr = test.derive_node(0, 0).unwrap().address.to_string();
        assert!(main_addr.starts_with('1'));
        assert!(test_addr.starts_with('m') || test_addr.starts_with('n'));
    }

    #[test]
    fn test_fingerprint_isolation() {
        let a = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        let b = SeedManager::from_hex(SEED, Network::Mainnet).unwrap();
        let c = SeedManager::generate(Network::Testnet).unwrap();
        assert!(a.fingerprint().ends_with("/testnet"));
        assert!(b.fingerprint().ends_with("/mainnet"));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        // 64 hex chars + '/' + network name
        assert_eq!(a.fingerprint().len(), 64 + 1 + "testnet".len());
    }

    #[test]
    fn test_seed_round_trip_and_validation() {
        let seeds = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        assert_eq!(seeds.seed_hex(), SEED);
        assert_eq!(SeedManager::generate(Network::Mainnet).unwrap().seed_hex().len(), 64);
        assert!(matches!(SeedManager::from_hex("abcd", Network::Testnet), Err(WalletError::InvalidSeed(_))));
        assert!(matches!(SeedManager::from_hex("zz", Network::Testnet), Err(WalletError::InvalidSeed(_))));
    }

    #[test]
    fn test_account_xpub_prefix() {
        let test = SeedManager::from_hex(SEED, Network::Testnet).unwrap();
        let main = SeedManager::from_hex(SEED, Network::Mainnet).unwrap();
        assert!(test.account_xpub(0).unwrap().to_string().starts_with("tpub"));
        assert!(main.account_xpub(0).unwrap().to_string().starts_with("xpub"));
        assert_ne!(test.account_xpub(0).unwrap().to_string(), test.account_xpub(1).unwrap().to_string());
    }
}

//! PathCodec - BIP44 derivation paths to and from their canonical string form.
//!
//! ```text
//! m / 44' / coin_type' / account' / change / address_index
//! ```
//!
//! Purpose, coin type and account are hardened. Change and index are not.

use bitcoin::bip32::ChildNumber;
use std::fmt;
use std::str::FromStr;

/// BIP44 purpose segment.
pub const PURPOSE: u32 = 44;
/// Coin type segment. Shared by mainnet and testnet wallets.
pub const COIN_TYPE: u32 = 0;

const ROOT: &str = "m";
const HARDENED_MARKER: char = '\'';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path must start with \"m\"")]
    MissingRoot,
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    #[error("segment {0:?} is not a non-negative integer")]
    NotNumeric(String),
    #[error("segment {0:?} is out of range")]
    OutOfRange(String),
}

/// BIP44 change chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chain {
    /// Receiving addresses (change = 0).
    #[default]
    External,
    /// Change addresses (change = 1).
    Internal,
}

impl Chain {
    pub fn index(self) -> u32 {
        match self {
            Chain::External => 0,
            Chain::Internal => 1,
        }
    }
}

impl From<bool> for Chain {
    fn from(change: bool) -> Self {
        if change { Chain::Internal } else { Chain::External }
    }
}

/// Parsed derivation path. Segments are replayed in order against the master node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    segments: Vec<ChildNumber>,
}

impl DerivationPath {
    /// BIP44 path for `account` on `chain` at `address_index`.
    pub fn bip44(account: u32, chain: Chain, address_index: u32) -> Result<Self, PathError> {
        Ok(Self {
            segments: vec![
                hardened(PURPOSE)?,
                hardened(COIN_TYPE)?,
                hardened(account)?,
                normal(chain.index())?,
                normal(address_index)?,
            ],
        })
    }

    pub fn segments(&self) -> &[ChildNumber] {
        &self.segments
    }

    /// Account index, when this is a five-segment BIP44 path.
    pub fn account(&self) -> Option<u32> {
        match self.segments.as_slice() {
            [_, _, ChildNumber::Hardened { index }, _, _] => Some(*index),
            _ => None,
        }
    }

    /// Address index, when this is a five-segment BIP44 path.
    pub fn address_index(&self) -> Option<u32> {
        match self.segments.as_slice() {
            [_, _, _, _, ChildNumber::Normal { index }] => Some(*index),
            _ => None,
        }
    }

    pub fn to_bip32(&self) -> bitcoin::bip32::DerivationPath {
        bitcoin::bip32::DerivationPath::from(self.segments.clone())
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT)?;
        for segment in &self.segments {
            match segment {
                ChildNumber::Hardened { index } => write!(f, "/{}{}", index, HARDENED_MARKER)?,
                ChildNumber::Normal { index } => write!(f, "/{}", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Canonical path string for an address on the given chain.
pub fn encode(account: u32, chain: Chain, address_index: u32) -> String {
    format!(
        "{root}/{PURPOSE}{h}/{COIN_TYPE}{h}/{account}{h}/{}/{address_index}",
        chain.index(),
        root = ROOT,
        h = HARDENED_MARKER,
    )
}

/// Parse a path string. Fails on the first bad segment, never returns a partial path.
pub fn decode(path: &str) -> Result<DerivationPath, PathError> {
    let mut parts = path.split('/');
    if parts.next() != Some(ROOT) {
        return Err(PathError::MissingRoot);
    }

    let segments = parts
        .enumerate()
        .map(|(pos, raw)| parse_segment(pos + 1, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DerivationPath { segments })
}

fn parse_segment(pos: usize, raw: &str) -> Result<ChildNumber, PathError> {
    if raw.is_empty() {
        return Err(PathError::EmptySegment(pos));
    }
    let (digits, is_hardened) = match raw.strip_suffix(HARDENED_MARKER) {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::NotNumeric(raw.to_string()));
    }
    let index: u32 = digits.parse().map_err(|_| PathError::OutOfRange(raw.to_string()))?;
    let child = if is_hardened { hardened(index) } else { normal(index) };
    child.map_err(|_| PathError::OutOfRange(raw.to_string()))
}

fn hardened(index: u32) -> Result<ChildNumber, PathError> {
    ChildNumber::from_hardened_idx(index).map_err(|_| PathError::OutOfRange(format!("{}'", index)))
}

fn normal(index: u32) -> Result<ChildNumber, PathError> {
    ChildNumber::from_normal_idx(index).map_err(|_| PathError::OutOfRange(index.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_first_address() {
        assert_eq!(encode(0, Chain::External, 0), "m/44'/0'/0'/0/0");
        assert_eq!(encode(7, Chain::Internal, 12), "m/44'/0'/7'/1/12");
    }

    #[test]
    fn test_decode_matches_bip44_builder() {
        let decoded = decode(&encode(3, Chain::External, 9)).unwrap();
        assert_eq!(decoded, DerivationPath::bip44(3, Chain::External, 9).unwrap());
        assert_eq!(decoded.account(), Some(3));
        assert_eq!(decoded.address_index(), Some(9));
        assert_eq!(decoded.to_string(), "m/44'/0'/3'/0/9");
    }

    #[test]
    fn test_decode_hardened_flags() {
        let path = decode("m/44'/0'/2'/0/5").unwrap();
        let flags: Vec<bool> = path.segments().iter().map(|c| c.is_hardened()).collect();
        assert_eq!(flags, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_decode_root_only() {
        let path = decode("m").unwrap();
        assert!(path.segments().is_empty());
        assert_eq!(path.account(), None);
    }

    #[test]
    fn test_decode_rejects_missing_root() {
        assert_eq!(decode("44'/0'/0'/0/0"), Err(PathError::MissingRoot));
        assert_eq!(decode("M/44'"), Err(PathError::MissingRoot));
        assert_eq!(decode(""), Err(PathError::MissingRoot));
    }

    #[test]
    fn test_decode_rejects_empty_segments() {
        assert_eq!(decode("m/"), Err(PathError::EmptySegment(1)));
        assert_eq!(decode("m/44'//0"), Err(PathError::EmptySegment(2)));
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        assert!(matches!(decode("m/44'/x/0"), Err(PathError::NotNumeric(_))));
        assert!(matches!(decode("m/44'/'"), Err(PathError::NotNumeric(_))));
        assert!(matches!(decode("m/-1"), Err(PathError::NotNumeric(_))));
        assert!(matches!(decode("m/+1"), Err(PathError::NotNumeric(_))));
        assert!(matches!(decode("m/1''"), Err(PathError::NotNumeric(_))));
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        // Normal indices stop at 2^31 - 1.
        assert!(matches!(decode("m/2147483648"), Err(PathError::OutOfRange(_))));
        assert!(matches!(decode("m/99999999999"), Err(PathError::OutOfRange(_))));
    }

    #[test]
    fn test_from_str() {
        let path: DerivationPath = "m/44'/0'/1'/0/0".parse().unwrap();
        assert_eq!(path.account(), Some(1));
    }
}

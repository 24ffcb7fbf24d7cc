// Consensus-critical. Changes require spec update + tests.
//! Canonical protocol types for the ShaiHive chain.
//!
//! This module defines all consensus-visible data structures and primitive
//! value types used across the protocol. All types here must remain
//! backward-compatible once released.

use crate::constants::*;
use borsh::{BorshDeserialize, BorshSerialize};
use core::fmt;
use core::ops::BitXor;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors related to parsing, validation, or construction of core protocol types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Hex string had an unexpected byte length.
    #[error("invalid hex length: expected {expected} bytes, got {got} bytes")]
    InvalidHexLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        got: usize,
    },

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Arithmetic overflow or underflow occurred.
    #[error("amount overflow or underflow")]
    AmountOverflow,

    /// Header bytes ended before all fields were read.
    #[error("truncated header bytes")]
    TruncatedHeader,

    /// A value violated protocol constraints.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

/// Fixed-size 32-byte hash used throughout the protocol.
///
/// Bytes are stored in serialization (little-endian) order. The textual
/// form used by `Display`/`FromStr` is the byte-reversed hex rendering,
/// i.e. the big-endian number every block hash and target is quoted as.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hash32(pub [u8; HASH32_LEN]);

impl Hash32 {
    /// Returns an all-zero hash.
    pub const fn zero() -> Self {
        Self([0u8; HASH32_LEN])
    }

    /// Returns the underlying byte array (serialization order).
    pub const fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }

    /// Parses a 64-character display-order hex string at compile time.
    ///
    /// Intended for chain-parameter constants; panics on malformed input,
    /// which in const context is a compile error.
    pub const fn literal(s: &str) -> Self {
        const fn digit(c: u8) -> u8 {
            match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => panic!("invalid hex digit in hash literal"),
            }
        }
        let b = s.as_bytes();
        assert!(b.len() == 2 * HASH32_LEN, "hash literal must be 64 hex chars");
        let mut out = [0u8; HASH32_LEN];
        let mut i = 0;
        while i < HASH32_LEN {
            // Display order is byte-reversed relative to storage order.
            out[HASH32_LEN - 1 - i] = (digit(b[2 * i]) << 4) | digit(b[2 * i + 1]);
            i += 1;
        }
        Self(out)
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({self})")
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rev = self.0;
        rev.reverse();
        f.write_str(&hex::encode(rev))
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(value: [u8; HASH32_LEN]) -> Self {
        Self(value)
    }
}

impl From<Hash32> for [u8; HASH32_LEN] {
    fn from(value: Hash32) -> Self {
        value.0
    }
}

impl FromStr for Hash32 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != HASH32_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: HASH32_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_LEN];
        for (i, b) in bytes.iter().enumerate() {
            arr[HASH32_LEN - 1 - i] = *b;
        }
        Ok(Self(arr))
    }
}

impl BitXor for Hash32 {
    type Output = Hash32;

    fn bitxor(self, rhs: Hash32) -> Hash32 {
        let mut out = [0u8; HASH32_LEN];
        for i in 0..HASH32_LEN {
            out[i] = self.0[i] ^ rhs.0[i];
        }
        Hash32(out)
    }
}

/// Block hash type (SHA-256 of the header's cycle array).
pub type BlockHash = Hash32;

/// The Hamiltonian-cycle solution carried by a block header.
///
/// The first `n` slots hold a permutation of `[0, n)` starting at vertex 0,
/// where `n` is the derived graph size; the remainder hold [`CYCLE_SENTINEL`].
#[derive(Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CycleSolution(pub [u16; CYCLE_SLOTS]);

impl CycleSolution {
    /// Returns an all-sentinel (empty) solution.
    pub const fn empty() -> Self {
        Self([CYCLE_SENTINEL; CYCLE_SLOTS])
    }

    /// Builds a solution from a vertex path, padding with sentinels.
    ///
    /// Paths longer than the array are truncated.
    pub fn from_path(path: &[u16]) -> Self {
        let mut out = [CYCLE_SENTINEL; CYCLE_SLOTS];
        let n = path.len().min(CYCLE_SLOTS);
        out[..n].copy_from_slice(&path[..n]);
        Self(out)
    }

    /// Number of slots before the first sentinel.
    pub fn len(&self) -> usize {
        self.0
            .iter()
            .position(|&w| w == CYCLE_SENTINEL)
            .unwrap_or(CYCLE_SLOTS)
    }

    /// Whether no vertices are recorded at all.
    pub fn is_empty(&self) -> bool {
        self.0[0] == CYCLE_SENTINEL
    }

    /// The raw slot array.
    pub const fn as_words(&self) -> &[u16; CYCLE_SLOTS] {
        &self.0
    }
}

impl Default for CycleSolution {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for CycleSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CycleSolution(len={})", self.len())
    }
}

/// Block header containing consensus-critical metadata.
///
/// Two digests derive from a header: the canonical block hash (SHA-256 of
/// the cycle array alone) and the body hash (SHA-256 of the wire form with
/// the cycle blanked), which seeds graph construction. See the
/// `serialization` module.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlockHeader {
    /// Protocol version.
    pub version: i32,
    /// Hash of the previous block.
    pub prev: BlockHash,
    /// Merkle root of transaction identifiers.
    pub merkle_root: Hash32,
    /// Block timestamp (Unix seconds).
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
    /// Legacy RandomX mix digest.
    ///
    /// Present only on blocks with `time <= LEGACY_MIX_CUTOFF_TIME`;
    /// `None` on every modern block. Never enters either digest.
    pub randomx_mix: Option<Hash32>,
    /// Hamiltonian-cycle solution for the header-derived graph.
    pub cycle: CycleSolution,
}

/// Amount expressed in the smallest unit ("atoms").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Amount(pub u64);

impl Amount {
    /// Returns a zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Constructs an amount from atoms.
    pub const fn from_atoms(atoms: u64) -> Self {
        Self(atoms)
    }

    /// Constructs an amount from whole coins.
    pub const fn from_coins(coins: u64) -> Self {
        Self(coins * COIN)
    }

    /// Returns the underlying atom value.
    pub const fn atoms(self) -> u64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Amount) -> Result<Self, CoreError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Amount) -> Result<Self, CoreError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({} atoms)", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / COIN, self.0 % COIN)
    }
}

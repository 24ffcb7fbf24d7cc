// Consensus-critical. Changes require spec update + tests.
//! Chain weight derived from proof-of-work targets.
//!
//! Every block weighs the expected number of scan attempts its compact
//! target represents, and the active chain is the branch whose tip has
//! accumulated the most. Equal weights fall back to the numerically
//! lower block identifier, which for this chain is the cycle digest.

use crate::difficulty::{bits_to_target, hash_to_uint};
use crate::error::ConsensusError;
use num_bigint::BigUint;
use num_traits::One;
use shaihive_core::BlockHash;

/// Accumulated proof-of-work weight of a chain.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct ChainWork(BigUint);

impl ChainWork {
    /// Weight of an empty chain.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Expected attempts for one block at the given compact target:
    /// `floor(2^256 / (target + 1))`, evaluated as
    /// `(max_u256 - target) / (target + 1) + 1` so every intermediate
    /// stays within 256 bits.
    pub fn from_bits(bits: u32) -> Result<Self, ConsensusError> {
        let target = bits_to_target(bits)?;
        let max = (BigUint::one() << 256u32) - BigUint::one();
        let work = (&max - &target) / (&target + BigUint::one()) + BigUint::one();
        Ok(Self(work))
    }

    /// Weight of this chain extended by one block at `bits`.
    pub fn extended_with(&self, bits: u32) -> Result<Self, ConsensusError> {
        let block = Self::from_bits(bits)?;
        Ok(Self(&self.0 + &block.0))
    }

    /// The raw integer weight.
    pub fn as_uint(&self) -> &BigUint {
        &self.0
    }
}

/// Pick between two tips: more accumulated work wins, and equal work
/// falls back to the lower cycle digest so every node converges on the
/// same branch.
pub fn heavier_tip(
    a_work: &ChainWork,
    a_hash: &BlockHash,
    b_work: &ChainWork,
    b_hash: &BlockHash,
) -> bool {
    if a_work != b_work {
        a_work > b_work
    } else {
        hash_to_uint(a_hash) < hash_to_uint(b_hash)
    }
}

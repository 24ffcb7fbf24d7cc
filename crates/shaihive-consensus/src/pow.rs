// Consensus-critical. Changes require spec update + tests.
//! Composite proof-of-work verification.
//!
//! A block proves work two ways at once: a SHA-256 digest under the
//! compact target, and a Hamiltonian cycle in a graph derived from the
//! header body. Three historical variants exist, keyed on header time;
//! all must be honored to reconstruct the chain.

use crate::difficulty::{bits_to_target, hash_meets_target, pow_limit_target};
use crate::error::ConsensusError;
use crate::graph::{generate_graph, generate_graph_v2, grid_size_v1, grid_size_v2, Graph};
use crate::hamilton::verify_hamiltonian_cycle;
use shaihive_core::{
    block_hash, body_sha256, sha256, BlockHeader, ChainParams, CycleSolution, Hash32,
};
use std::time::Duration;

/// Proof-of-work rule revisions, selected by header time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowVariant {
    /// Original rules: cycle digest under target, XOR-derived seed.
    V1,
    /// Block hash under target, body hash as seed.
    V2,
    /// As V2 but with the MT19937-64 graph at full width.
    V3,
}

impl PowVariant {
    /// The variant governing a header with the given timestamp.
    ///
    /// Boundaries are inclusive on the earlier variant.
    pub fn for_time(time: u32, params: &ChainParams) -> Self {
        if time <= params.pow_v2_switch_time {
            PowVariant::V1
        } else if time <= params.pow_v3_switch_time {
            PowVariant::V2
        } else {
            PowVariant::V3
        }
    }

    /// Wall-clock budget for one producer-side cycle search.
    ///
    /// Policy for miners only; verification never applies a deadline.
    pub fn solver_budget(&self) -> Duration {
        match self {
            PowVariant::V1 | PowVariant::V2 => Duration::from_secs(3),
            PowVariant::V3 => Duration::from_secs(1),
        }
    }

    /// The graph seed this variant derives from a body hash.
    pub fn graph_seed(&self, body_hash: &Hash32) -> Hash32 {
        match self {
            PowVariant::V1 => *body_hash ^ sha256(body_hash.as_bytes()),
            PowVariant::V2 | PowVariant::V3 => *body_hash,
        }
    }

    /// Build this variant's graph from a seed.
    pub fn build_graph(&self, seed: &Hash32) -> Graph {
        match self {
            PowVariant::V1 | PowVariant::V2 => generate_graph(seed, grid_size_v1(seed)),
            PowVariant::V3 => generate_graph_v2(seed, grid_size_v2(seed)),
        }
    }
}

/// Check proof of work for one block.
///
/// `body_hash` is the header digest with the cycle blanked; `block_hash`
/// is the canonical identifier the caller computed for the block. Any
/// deviation (range, target, permutation, missing edge) yields `false`;
/// there is no partial credit at this layer.
pub fn check_proof_of_work(
    params: &ChainParams,
    time: u32,
    body_hash: &Hash32,
    block_hash: &Hash32,
    bits: u32,
    cycle: &CycleSolution,
) -> bool {
    let target = match bits_to_target(bits) {
        Ok(target) => target,
        Err(_) => return false,
    };
    if target > pow_limit_target(params) {
        return false;
    }

    let variant = PowVariant::for_time(time, params);

    // The hash half of the proof. V1 recomputes the cycle digest rather
    // than trusting the caller's identifier.
    let meets = match variant {
        PowVariant::V1 => match shaihive_core::cycle_hash(cycle.as_words()) {
            Ok(gold) => hash_meets_target(&gold, &target),
            Err(_) => false,
        },
        PowVariant::V2 | PowVariant::V3 => hash_meets_target(block_hash, &target),
    };
    if !meets {
        return false;
    }

    // The cycle half: rebuild the graph the header commits to.
    let seed = variant.graph_seed(body_hash);
    let graph = variant.build_graph(&seed);
    verify_hamiltonian_cycle(&graph, cycle)
}

/// Validate proof of work for a header, deriving both digests.
pub fn validate_pow(params: &ChainParams, header: &BlockHeader) -> Result<(), ConsensusError> {
    let body = body_sha256(header)
        .map_err(|_| ConsensusError::InvalidHeader("header hashing failed"))?;
    let hash = block_hash(header)
        .map_err(|_| ConsensusError::InvalidHeader("header hashing failed"))?;
    if !check_proof_of_work(params, header.time, &body, &hash, header.bits, &header.cycle) {
        return Err(ConsensusError::InsufficientPoW);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaihive_core::RegTestOptions;

    #[test]
    fn variant_switches_at_boundaries() {
        let params = ChainParams::main();
        let t2 = params.pow_v2_switch_time;
        let t3 = params.pow_v3_switch_time;
        assert_eq!(PowVariant::for_time(t2 - 1, &params), PowVariant::V1);
        assert_eq!(PowVariant::for_time(t2, &params), PowVariant::V1);
        assert_eq!(PowVariant::for_time(t2 + 1, &params), PowVariant::V2);
        assert_eq!(PowVariant::for_time(t3, &params), PowVariant::V2);
        assert_eq!(PowVariant::for_time(t3 + 1, &params), PowVariant::V3);
    }

    #[test]
    fn regtest_overrides_move_boundaries() {
        let params = ChainParams::regtest(RegTestOptions {
            pow_v2_switch_time: Some(1000),
            pow_v3_switch_time: Some(2000),
            retarget_v2_switch_height: None,
        });
        assert_eq!(PowVariant::for_time(1000, &params), PowVariant::V1);
        assert_eq!(PowVariant::for_time(1500, &params), PowVariant::V2);
        assert_eq!(PowVariant::for_time(2001, &params), PowVariant::V3);
    }

    #[test]
    fn solver_budget_per_variant() {
        assert_eq!(PowVariant::V1.solver_budget(), Duration::from_secs(3));
        assert_eq!(PowVariant::V2.solver_budget(), Duration::from_secs(3));
        assert_eq!(PowVariant::V3.solver_budget(), Duration::from_secs(1));
    }

    #[test]
    fn v1_seed_xors_in_second_digest() {
        let body = sha256(b"body");
        let second = sha256(body.as_bytes());
        assert_eq!(PowVariant::V1.graph_seed(&body), body ^ second);
        assert_eq!(PowVariant::V2.graph_seed(&body), body);
        assert_eq!(PowVariant::V3.graph_seed(&body), body);
    }

    #[test]
    fn malformed_bits_rejected() {
        let params = ChainParams::main();
        let cycle = CycleSolution::empty();
        let zero = Hash32::zero();
        // Negative, zero, overflow, above the limit.
        for bits in [0x2080_0001u32, 0, 0xff7f_ffff, 0x2100_ffff] {
            assert!(!check_proof_of_work(&params, 0, &zero, &zero, bits, &cycle));
        }
    }
}

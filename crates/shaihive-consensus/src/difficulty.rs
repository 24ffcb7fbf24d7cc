// Consensus-critical. Changes require spec update + tests.
//! Difficulty target utilities.
//!
//! Targets travel in block headers as a Bitcoin-style "compact" encoding:
//! top byte = exponent `E`, low 23 bits = mantissa `M`, bit 23 = sign.
//! The decoded value is `M * 256^(E-3)`:
//!
//! - exponent = (bits >> 24) as u8
//! - mantissa = bits & 0x007fffff
//!
//! This module provides strict, consensus-safe conversions without floats,
//! plus the permitted-transition bound applied between consecutive blocks.

use crate::error::ConsensusError;
use num_bigint::BigUint;
use num_traits::Zero;
use shaihive_core::{ChainParams, Hash32};

/// Decode compact `bits` to a full target (`BigUint`).
///
/// Rejects encodings that are negative, overflow 256 bits, or represent zero.
pub fn bits_to_target(bits: u32) -> Result<BigUint, ConsensusError> {
    let exponent = (bits >> 24) & 0xff;
    let mantissa = bits & 0x007f_ffff;

    if (bits & 0x0080_0000) != 0 && mantissa != 0 {
        return Err(ConsensusError::NegativeBits);
    }

    // Overflow predicate: any mantissa byte shifted past the 32nd octet.
    if mantissa != 0
        && (exponent > 34
            || (mantissa > 0xff && exponent > 33)
            || (mantissa > 0xffff && exponent > 32))
    {
        return Err(ConsensusError::OverflowBits);
    }

    let target = if exponent <= 3 {
        BigUint::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigUint::from(mantissa) << (8 * (exponent - 3))
    };

    if target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }

    Ok(target)
}

/// Encode a target (`BigUint`) into compact `bits`.
///
/// The encoding is normalized: a mantissa with its high bit set is shifted
/// down one byte with the exponent bumped, so no value encodes as negative.
pub fn target_to_bits(target: &BigUint) -> Result<u32, ConsensusError> {
    if target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }

    let mut bytes = target.to_bytes_be();
    let mut exponent = bytes.len() as u32;

    while bytes.len() < 3 {
        bytes.push(0);
    }
    let mut mantissa = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);

    if (mantissa & 0x0080_0000) != 0 {
        mantissa >>= 8;
        exponent = exponent.checked_add(1).ok_or(ConsensusError::OverflowBits)?;
    }

    mantissa &= 0x007f_ffff;
    if mantissa == 0 {
        return Err(ConsensusError::InvalidTarget);
    }
    if exponent > 0xff {
        return Err(ConsensusError::OverflowBits);
    }

    Ok((exponent << 24) | mantissa)
}

/// Numeric value of a 32-byte hash under this chain's comparison semantics
/// (serialization-order bytes read as a little-endian integer).
pub fn hash_to_uint(hash: &Hash32) -> BigUint {
    BigUint::from_bytes_le(hash.as_bytes())
}

/// Compare a hash with a target. Returns `true` if `hash <= target`.
pub fn hash_meets_target(hash: &Hash32, target: &BigUint) -> bool {
    hash_to_uint(hash) <= *target
}

/// The network's target ceiling as a full integer.
pub fn pow_limit_target(params: &ChainParams) -> BigUint {
    hash_to_uint(&params.pow_limit)
}

/// The network's target ceiling in compact form.
pub fn pow_limit_compact(params: &ChainParams) -> Result<u32, ConsensusError> {
    target_to_bits(&pow_limit_target(params))
}

/// Check that a difficulty transition stays within the permitted band.
///
/// Below the retarget switch height the band is
/// `[old * 100/117, old * 133/100]`; at or above it, the tighter
/// `[old * 100/106, old * 112/100]`. Integer rounding here is
/// consensus-critical.
pub fn permitted_difficulty_transition(
    params: &ChainParams,
    tip_height: u32,
    old_bits: u32,
    new_bits: u32,
) -> bool {
    let (old_target, new_target) = match (bits_to_target(old_bits), bits_to_target(new_bits)) {
        (Ok(old), Ok(new)) => (old, new),
        _ => return false,
    };

    let (up_num, down_den): (u32, u32) = if tip_height >= params.retarget_v2_switch_height {
        (112, 106)
    } else {
        (133, 117)
    };

    let max_increase = (&old_target * up_num) / 100u32;
    let max_decrease = (&old_target * 100u32) / down_den;

    new_target <= max_increase && new_target >= max_decrease
}

// Consensus-critical. Changes require spec update + tests.
//! Canonical serialization and hashing.
//!
//! The header wire form is positional little-endian:
//!
//! ```text
//! version(4) || prev(32) || merkle_root(32) || time(4) || bits(4) || nonce(4)
//!   || [randomx_mix(32) iff time <= LEGACY_MIX_CUTOFF_TIME] || cycle(1992 x 2)
//! ```
//!
//! Fields stream through their Borsh serializers, which emit exactly this
//! layout; the only conditional piece is the legacy mix window. Two digests
//! derive from a header:
//!
//! - the canonical block hash: SHA-256 over the cycle array alone;
//! - the body hash: SHA-256 over the wire form with the cycle replaced by
//!   sentinels and the mix (when present) zeroed. The cycle is part of block
//!   identity but derived from the body, so the body digest must exclude it.

use crate::constants::*;
use crate::types::{BlockHeader, CoreError, CycleSolution, Hash32};
use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};
use std::io::{self, Write};

/// Incremental SHA-256 sink; serialized fields written into it contribute
/// to a single digest obtained with [`HashWriter::finalize`].
pub struct HashWriter {
    hasher: Sha256,
}

impl HashWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { hasher: Sha256::new() }
    }

    /// Consumes the writer and returns the digest.
    pub fn finalize(self) -> Hash32 {
        let digest = self.hasher.finalize();
        let mut out = [0u8; HASH32_LEN];
        out.copy_from_slice(&digest);
        Hash32(out)
    }
}

impl Default for HashWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hasher.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// SHA-256 of a byte slice.
pub fn sha256(bytes: &[u8]) -> Hash32 {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; HASH32_LEN];
    out.copy_from_slice(&digest);
    Hash32(out)
}

fn ser<T: BorshSerialize, W: Write>(value: &T, writer: &mut W) -> Result<(), CoreError> {
    value
        .serialize(writer)
        .map_err(|_| CoreError::InvalidValue("serialization failed"))
}

fn de<T: BorshDeserialize>(reader: &mut &[u8]) -> Result<T, CoreError> {
    T::deserialize(reader).map_err(|_| CoreError::TruncatedHeader)
}

/// Whether a header at `time` carries the legacy RandomX mix on the wire.
pub const fn carries_legacy_mix(time: u32) -> bool {
    time <= LEGACY_MIX_CUTOFF_TIME
}

/// SHA-256 over cycle words serialized little-endian.
///
/// This is the canonical block identifier applied to a header's array.
/// It is deliberately length-agnostic: headers from before the 1992-slot
/// normalization carried wider arrays and keep their identities.
pub fn cycle_hash(words: &[u16]) -> Result<Hash32, CoreError> {
    let mut writer = HashWriter::new();
    for word in words {
        ser(word, &mut writer)?;
    }
    Ok(writer.finalize())
}

/// Canonical block hash: SHA-256 of the header's cycle array.
pub fn block_hash(header: &BlockHeader) -> Result<Hash32, CoreError> {
    cycle_hash(header.cycle.as_words())
}

fn write_fixed_fields<W: Write>(header: &BlockHeader, writer: &mut W) -> Result<(), CoreError> {
    ser(&header.version, writer)?;
    ser(&header.prev, writer)?;
    ser(&header.merkle_root, writer)?;
    ser(&header.time, writer)?;
    ser(&header.bits, writer)?;
    ser(&header.nonce, writer)?;
    Ok(())
}

/// Body hash: SHA-256 over the wire form with the cycle blanked to
/// sentinels and the mix field (when the layout carries one) zeroed.
pub fn body_sha256(header: &BlockHeader) -> Result<Hash32, CoreError> {
    let mut writer = HashWriter::new();
    write_fixed_fields(header, &mut writer)?;
    if carries_legacy_mix(header.time) {
        ser(&Hash32::zero(), &mut writer)?;
    }
    ser(&CycleSolution::empty(), &mut writer)?;
    Ok(writer.finalize())
}

/// Encodes a header into its wire form.
///
/// The mix field is written iff the header's time is within the legacy
/// window; a `None` mix in that window encodes as zeroes.
pub fn encode_header(header: &BlockHeader) -> Result<Vec<u8>, CoreError> {
    let legacy = carries_legacy_mix(header.time);
    let mut out = Vec::with_capacity(if legacy { LEGACY_HEADER_LEN } else { HEADER_LEN });
    write_fixed_fields(header, &mut out)?;
    if legacy {
        ser(&header.randomx_mix.unwrap_or(Hash32::zero()), &mut out)?;
    }
    ser(&header.cycle, &mut out)?;
    Ok(out)
}

/// Decodes a header from its wire form.
///
/// The already-read `time` field decides whether a mix field follows the
/// nonce, mirroring [`encode_header`].
pub fn decode_header(bytes: &[u8]) -> Result<BlockHeader, CoreError> {
    let mut reader = bytes;
    let version: i32 = de(&mut reader)?;
    let prev: Hash32 = de(&mut reader)?;
    let merkle_root: Hash32 = de(&mut reader)?;
    let time: u32 = de(&mut reader)?;
    let bits: u32 = de(&mut reader)?;
    let nonce: u32 = de(&mut reader)?;
    let randomx_mix = if carries_legacy_mix(time) {
        Some(de::<Hash32>(&mut reader)?)
    } else {
        None
    };
    let cycle: CycleSolution = de(&mut reader)?;
    Ok(BlockHeader {
        version,
        prev,
        merkle_root,
        time,
        bits,
        nonce,
        randomx_mix,
        cycle,
    })
}

// Consensus-critical. Changes require spec update + tests.
//! Consensus validation helpers for block headers.
//!
//! This module does not touch chain state and does not run the miner. It
//! validates self-contained header properties, the difficulty transition
//! against the active tip, and proof-of-work.

use crate::difficulty::{bits_to_target, permitted_difficulty_transition, pow_limit_target};
use crate::error::ConsensusError;
use crate::pow::validate_pow;
use crate::retarget::{next_work_required, ChainTip};
use shaihive_core::{BlockHeader, ChainParams, Hash32};
use time::OffsetDateTime;

/// How far ahead of the local clock a header timestamp may sit.
const MAX_FUTURE_DRIFT_SECS: u64 = 2 * 60 * 60;
/// Headers contributing to median-time-past.
const MTP_WINDOW: usize = 11;

/// Validate basic header invariants plus timestamp rules (MTP + drift).
pub fn validate_header_sanity(
    params: &ChainParams,
    header: &BlockHeader,
    median_time_past: Option<u32>,
) -> Result<(), ConsensusError> {
    if header.time == 0 {
        return Err(ConsensusError::InvalidHeader("timestamp must be non-zero"));
    }

    // Genesis is permitted an arbitrary fixed timestamp; skip MTP/drift.
    if header.prev != Hash32::zero() {
        let mtp = median_time_past.ok_or(ConsensusError::InvalidHeader(
            "missing median-time-past for non-genesis",
        ))?;
        if header.time <= mtp {
            return Err(ConsensusError::InvalidHeader("timestamp below MTP"));
        }

        let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        if exceeds_future_drift(header.time, now) {
            return Err(ConsensusError::InvalidHeader(
                "timestamp too far in the future",
            ));
        }
    }

    // Difficulty bits must decode to a usable target within the limit.
    let target = bits_to_target(header.bits)?;
    if target > pow_limit_target(params) {
        return Err(ConsensusError::InvalidTarget);
    }

    Ok(())
}

/// Validate a header against the active tip: linkage, difficulty, and
/// proof-of-work, in that order.
pub fn validate_header_contextual(
    params: &ChainParams,
    tip: &ChainTip,
    header: &BlockHeader,
    median_time_past: Option<u32>,
) -> Result<(), ConsensusError> {
    if header.prev != tip.hash {
        return Err(ConsensusError::InvalidHeader("header does not extend tip"));
    }

    if !permitted_difficulty_transition(params, tip.height, tip.bits, header.bits) {
        return Err(ConsensusError::InvalidTarget);
    }

    let expected = next_work_required(params, tip, header.time)?;
    if header.bits != expected {
        return Err(ConsensusError::InvalidHeader("incorrect difficulty bits"));
    }

    validate_header_sanity(params, header, median_time_past)?;
    validate_pow(params, header)?;

    Ok(())
}

/// Whether a header timestamp sits too far ahead of the local clock.
///
/// Only the future is bounded here; the past is governed by
/// median-time-past.
pub fn exceeds_future_drift(header_time: u32, local_time: u64) -> bool {
    u64::from(header_time) > local_time.saturating_add(MAX_FUTURE_DRIFT_SECS)
}

/// Median-time-past over the most recent header timestamps.
///
/// Takes times oldest-first and considers the last eleven. Header times
/// need not arrive monotonic; the median is taken over the sorted window.
pub fn median_time_past(header_times: &[u32]) -> Option<u32> {
    if header_times.is_empty() {
        return None;
    }
    let start = header_times.len().saturating_sub(MTP_WINDOW);
    let mut window = header_times[start..].to_vec();
    window.sort_unstable();
    Some(window[window.len() / 2])
}

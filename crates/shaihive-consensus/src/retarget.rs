// Consensus-critical. Changes require spec update + tests.
//! Per-block difficulty retargeting.
//!
//! Two controllers exist. The interval controller adjusts from a single
//! block interval, measured candidate-to-tip below the switch height
//! (variant A) and tip-to-parent at or above it (variant B). The PID
//! controller steers the interval toward its own 300-second spacing over a
//! four-block window; it is selectable per network but no shipped network
//! enables it. The asymmetric multipliers ease faster than they tighten;
//! exact integer rounding is consensus-critical throughout.

use crate::difficulty::{bits_to_target, pow_limit_target, target_to_bits};
use crate::error::ConsensusError;
use num_bigint::BigUint;
use num_traits::Zero;
use shaihive_core::{BlockHash, ChainParams, RetargetAlgo};

/// Interval magnitude below which no adjustment happens.
const DEAD_BAND_SECS: i64 = 42;
/// Largest easing interval fed into the map.
const MAX_EASE_SECS: i64 = 600;

/// PID observation window in blocks.
const PID_WINDOW: usize = 4;
/// The PID controller's own target spacing in seconds.
const PID_SPACING: i64 = 300;
/// Proportional gain.
const PID_KP: f64 = 0.716;
/// Integral gain.
const PID_KI: f64 = 0.333;
/// Derivative gain.
const PID_KD: f64 = 0.042;

/// Snapshot of the active tip consumed by the difficulty controller.
#[derive(Clone, Debug)]
pub struct ChainTip {
    /// Canonical hash of the tip block.
    pub hash: BlockHash,
    /// Height of the tip block.
    pub height: u32,
    /// Tip header timestamp.
    pub time: u32,
    /// Tip compact target.
    pub bits: u32,
    /// Parent header timestamp (zero when the tip is genesis).
    pub prev_time: u32,
    /// Up to the last four block timestamps, oldest first (PID window).
    pub recent_times: Vec<u32>,
}

/// Integer linear interpolation, truncating toward zero exactly as the
/// original controller does.
fn map_number(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

fn clamp_to_pow_limit(params: &ChainParams, target: BigUint) -> Result<u32, ConsensusError> {
    let limit = pow_limit_target(params);
    if target.is_zero() || target > limit {
        return target_to_bits(&limit);
    }
    target_to_bits(&target)
}

/// Compute the compact target required of the block following `tip`.
pub fn next_work_required(
    params: &ChainParams,
    tip: &ChainTip,
    new_block_time: u32,
) -> Result<u32, ConsensusError> {
    if params.no_retargeting {
        return Ok(tip.bits);
    }

    if params.allow_min_difficulty_blocks
        && u64::from(new_block_time) > u64::from(tip.time) + 2 * params.target_spacing
    {
        // After a long gap anyone may mine a minimum-difficulty block.
        return target_to_bits(&pow_limit_target(params));
    }

    match params.retarget {
        RetargetAlgo::Interval => interval_retarget(params, tip, new_block_time),
        RetargetAlgo::Pid => pid_retarget(params, tip),
    }
}

fn interval_retarget(
    params: &ChainParams,
    tip: &ChainTip,
    new_block_time: u32,
) -> Result<u32, ConsensusError> {
    let spacing = params.target_spacing as i64;

    // Variant A measures candidate-to-tip; variant B tip-to-parent.
    let interval = if tip.height >= params.retarget_v2_switch_height {
        i64::from(tip.time) - i64::from(tip.prev_time)
    } else {
        i64::from(new_block_time) - i64::from(tip.time)
    };

    let mut new_target = bits_to_target(tip.bits)?;
    let mut balanced = interval - spacing;

    if balanced >= DEAD_BAND_SECS {
        if balanced > MAX_EASE_SECS {
            balanced = MAX_EASE_SECS;
        }
        new_target *= map_number(balanced, DEAD_BAND_SECS, MAX_EASE_SECS, 102, 111) as u64;
        new_target /= 100u32;
    } else if balanced <= -DEAD_BAND_SECS {
        if balanced < -spacing {
            balanced = -spacing;
        }
        new_target *= 100u32;
        new_target /= map_number(-balanced, DEAD_BAND_SECS, spacing, 101, 105) as u64;
    }

    clamp_to_pow_limit(params, new_target)
}

fn pid_retarget(params: &ChainParams, tip: &ChainTip) -> Result<u32, ConsensusError> {
    let times = &tip.recent_times;
    if times.len() < PID_WINDOW {
        return Ok(tip.bits);
    }
    let buf = &times[times.len() - PID_WINDOW..];

    // The accumulation is specified in IEEE-754 double precision; any
    // deviation forks the chain.
    let mut integral = 0.0f64;
    let mut control = 0.0f64;
    for i in 1..PID_WINDOW {
        let dt = i64::from(buf[i]) - i64::from(buf[i - 1]);
        let dt_prev = if i == 1 {
            0
        } else {
            i64::from(buf[i - 1]) - i64::from(buf[i - 2])
        };
        let err = (PID_SPACING - dt) as f64;
        let err_prev = if i == 1 { 0.0 } else { (PID_SPACING - dt_prev) as f64 };

        integral += err;
        let proportional = PID_KP * err;
        let integrated = PID_KI * integral;
        let derivative = if dt == 0 { 0.0 } else { PID_KD * (err - err_prev) / dt as f64 };
        control += proportional + integrated + derivative;
    }

    let mut response = (control / (PID_WINDOW - 1) as f64).round() as i64;
    let mut new_target = bits_to_target(tip.bits)?;

    if response < -DEAD_BAND_SECS {
        if response < -PID_SPACING {
            response = -PID_SPACING;
        }
        new_target *= map_number(-response, DEAD_BAND_SECS, PID_SPACING, 105, 132) as u64;
        new_target /= 100u32;
    } else if response > DEAD_BAND_SECS {
        let max_response = PID_SPACING * 124 / 100;
        if response > max_response {
            response = max_response;
        }
        new_target *= 100u32;
        new_target /= map_number(response, DEAD_BAND_SECS, max_response, 102, 116) as u64;
    }

    clamp_to_pow_limit(params, new_target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaihive_core::{ChainParams, Hash32, RegTestOptions};

    fn tip(height: u32, time: u32, bits: u32, prev_time: u32) -> ChainTip {
        ChainTip {
            hash: Hash32::zero(),
            height,
            time,
            bits,
            prev_time,
            recent_times: vec![],
        }
    }

    #[test]
    fn dead_band_keeps_bits() {
        let params = ChainParams::main();
        let t = tip(10, 1_000_000, 0x1f01_0000, 0);
        // Interval exactly at spacing, and within +-41 of it.
        for dt in [120i64, 120 + 41, 120 - 41] {
            let next =
                next_work_required(&params, &t, (1_000_000 + dt) as u32).unwrap();
            assert_eq!(next, 0x1f01_0000, "dt={dt}");
        }
    }

    #[test]
    fn easing_at_lower_map_boundary() {
        // d = 42 applies the easing branch at its 102/100 floor.
        let params = ChainParams::main();
        let t = tip(10, 1_000_000, 0x1f01_0000, 0);
        let next = next_work_required(&params, &t, 1_000_000 + 120 + 42).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 102u32 / 100u32),
        )
        .unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn easing_interpolates_with_truncation() {
        // d = 100: map(100, 42..600 -> 102..111) = 102 + (58 * 9) / 558 = 102.
        let params = ChainParams::main();
        let t = tip(10, 1_000_000, 0x1f01_0000, 0);
        let next = next_work_required(&params, &t, 1_000_000 + 120 + 100).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 102u32 / 100u32),
        )
        .unwrap();
        assert_eq!(next, expected);

        // d = 352: map = 102 + (310 * 9) / 558 = 107.
        let next = next_work_required(&params, &t, 1_000_000 + 120 + 352).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 107u32 / 100u32),
        )
        .unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn easing_clamps_at_600() {
        let params = ChainParams::main();
        let t = tip(10, 1_000_000, 0x1f01_0000, 0);
        let capped = next_work_required(&params, &t, 1_000_000 + 120 + 600).unwrap();
        let beyond = next_work_required(&params, &t, 1_000_000 + 120 + 9_999).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 111u32 / 100u32),
        )
        .unwrap();
        assert_eq!(capped, expected);
        assert_eq!(beyond, expected);
    }

    #[test]
    fn tightening_clamps_at_spacing() {
        // d = -S is the maximum tighten: old * 100 / 105.
        let params = ChainParams::main();
        let t = tip(10, 1_000_000, 0x1f01_0000, 0);
        let next = next_work_required(&params, &t, 1_000_000).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 100u32 / 105u32),
        )
        .unwrap();
        assert_eq!(next, expected);

        // d = -42 tightens at the 101 floor.
        let next = next_work_required(&params, &t, 1_000_000 + 120 - 42).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 100u32 / 101u32),
        )
        .unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn variant_b_measures_tip_to_parent() {
        let params = ChainParams::main();
        let height = params.retarget_v2_switch_height;

        // Candidate-to-tip interval says "ease", tip-to-parent says "hold".
        let t = tip(height, 1_000_000, 0x1f01_0000, 1_000_000 - 120);
        let next = next_work_required(&params, &t, 1_000_000 + 120 + 100).unwrap();
        assert_eq!(next, 0x1f01_0000);

        // And conversely, a slow parent interval eases regardless of the
        // candidate timestamp.
        let t = tip(height, 1_000_000, 0x1f01_0000, 1_000_000 - 120 - 100);
        let next = next_work_required(&params, &t, 1_000_000 + 120).unwrap();
        let expected = target_to_bits(
            &(bits_to_target(0x1f01_0000).unwrap() * 102u32 / 100u32),
        )
        .unwrap();
        assert_eq!(next, expected);

        // One block earlier the old variant still applies.
        let t = tip(height - 1, 1_000_000, 0x1f01_0000, 1_000_000 - 120 - 100);
        let next = next_work_required(&params, &t, 1_000_000 + 120).unwrap();
        assert_eq!(next, 0x1f01_0000);
    }

    #[test]
    fn output_clamped_to_pow_limit() {
        let params = ChainParams::main();
        let limit = crate::difficulty::pow_limit_compact(&params).unwrap();
        // Tip already at the limit; a slow block cannot ease past it.
        let t = tip(10, 1_000_000, limit, 0);
        let next = next_work_required(&params, &t, 1_000_000 + 120 + 600).unwrap();
        assert_eq!(next, limit);
    }

    #[test]
    fn no_retargeting_on_regtest() {
        let params = ChainParams::regtest(RegTestOptions::default());
        let t = tip(10, 1_000_000, 0x207f_ffff, 0);
        let next = next_work_required(&params, &t, 1_000_000 + 50_000).unwrap();
        assert_eq!(next, 0x207f_ffff);
    }

    #[test]
    fn min_difficulty_after_gap_on_testnet() {
        let params = ChainParams::testnet();
        let limit = crate::difficulty::pow_limit_compact(&params).unwrap();
        let t = tip(10, 1_000_000, 0x1e01_0000, 0);

        // Gap over 2 * spacing grants the minimum difficulty.
        let gap = (2 * params.target_spacing + 1) as u32;
        assert_eq!(next_work_required(&params, &t, 1_000_000 + gap).unwrap(), limit);

        // At exactly the boundary the normal controller applies.
        let at = (2 * params.target_spacing) as u32;
        assert_ne!(next_work_required(&params, &t, 1_000_000 + at).unwrap(), limit);
    }

    #[test]
    fn pid_holds_on_target_spacing() {
        let mut params = ChainParams::main();
        params.retarget = RetargetAlgo::Pid;
        let mut t = tip(10, 1_000_000, 0x1f01_0000, 0);
        // Perfectly spaced 300-second blocks: every error term is zero.
        t.recent_times = vec![1_000_000, 1_000_300, 1_000_600, 1_000_900];
        let next = next_work_required(&params, &t, 1_001_200).unwrap();
        assert_eq!(next, 0x1f01_0000);
    }

    #[test]
    fn pid_eases_when_blocks_lag() {
        let mut params = ChainParams::main();
        params.retarget = RetargetAlgo::Pid;
        let mut t = tip(10, 1_000_000, 0x1f01_0000, 0);
        // Constant 500-second intervals: e = -200 each step.
        // integral walks -200, -400, -600; u = sum of P + I + D terms:
        // P: 0.716 * -200 = -143.2 each;
        // I: -66.6, -133.2, -199.8; D: 0, -16.8/500 * ... (e - e_prev = 0
        // except the first step, where prev is the synthetic zero sample).
        t.recent_times = vec![1_000_000, 1_000_500, 1_001_000, 1_001_500];
        let next = next_work_required(&params, &t, 1_002_000).unwrap();
        let old = bits_to_target(0x1f01_0000).unwrap();
        let new = bits_to_target(next).unwrap();
        assert!(new > old, "lagging blocks must ease the target");
    }

    #[test]
    fn pid_tightens_when_blocks_race() {
        let mut params = ChainParams::main();
        params.retarget = RetargetAlgo::Pid;
        let mut t = tip(10, 1_000_000, 0x1f01_0000, 0);
        // 60-second intervals: strongly positive control response.
        t.recent_times = vec![1_000_000, 1_000_060, 1_000_120, 1_000_180];
        let next = next_work_required(&params, &t, 1_000_240).unwrap();
        let old = bits_to_target(0x1f01_0000).unwrap();
        let new = bits_to_target(next).unwrap();
        assert!(new < old, "racing blocks must tighten the target");
    }

    #[test]
    fn pid_with_short_history_holds() {
        let mut params = ChainParams::main();
        params.retarget = RetargetAlgo::Pid;
        let mut t = tip(1, 1_000_000, 0x1f01_0000, 0);
        t.recent_times = vec![1_000_000, 1_000_300];
        assert_eq!(next_work_required(&params, &t, 1_000_600).unwrap(), 0x1f01_0000);
    }
}

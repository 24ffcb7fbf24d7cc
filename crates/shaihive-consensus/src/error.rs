//! Consensus error types.

use thiserror::Error;

/// Errors returned by consensus validation and difficulty conversion code.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Compact target has the sign bit set with a non-zero mantissa.
    #[error("negative compact target")]
    NegativeBits,

    /// Compact target shifts past 256 bits.
    #[error("overflowing compact target")]
    OverflowBits,

    /// Target decoded to zero or otherwise unusable.
    #[error("invalid difficulty target")]
    InvalidTarget,

    /// Proof-of-work did not satisfy the composite predicate.
    #[error("insufficient proof of work")]
    InsufficientPoW,

    /// Header fields violated basic consensus constraints.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
}

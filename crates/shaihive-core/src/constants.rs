//! Protocol-wide constants for the ShaiHive chain.

/// Length in bytes of a 32-byte hash.
pub const HASH32_LEN: usize = 32;

/// Width of the cycle-solution array carried by every block header.
///
/// This is also the largest graph the PoW can derive; unused slots hold
/// [`CYCLE_SENTINEL`].
pub const CYCLE_SLOTS: usize = 1992;

/// Marker stored in unused cycle slots.
pub const CYCLE_SENTINEL: u16 = u16::MAX;

/// Smallest graph the grid-size selector can produce.
pub const MIN_GRAPH_SIZE: usize = 512;

/// Number of atomic units per one coin.
pub const COIN: u64 = 100_000_000;

/// Header timestamp at or before which the serialized form carries the
/// legacy 32-byte RandomX mix field.
///
/// Coincides with the V1 -> V2 proof-of-work switch on the main network;
/// blocks after this instant omit the field entirely.
pub const LEGACY_MIX_CUTOFF_TIME: u32 = 1_723_869_065;

/// Serialized header length in bytes for modern (post-mix) blocks.
pub const HEADER_LEN: usize = 4 + 32 + 32 + 4 + 4 + 4 + CYCLE_SLOTS * 2;

/// Serialized header length in bytes for legacy (mix-bearing) blocks.
pub const LEGACY_HEADER_LEN: usize = HEADER_LEN + 32;

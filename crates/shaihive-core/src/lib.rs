#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! ShaiHive core protocol types (v0).
//!
//! This crate is responsible for:
//! - consensus-visible data structures (headers, hashes, cycle solutions)
//! - canonical wire serialization and the two header digests
//! - per-network chain parameters
//!
//! It intentionally does **not** include target arithmetic, graph
//! construction, or mining; those live in `shaihive-consensus` and
//! `shaihive-miner`.

pub mod constants;
pub mod params;
pub mod serialization;
pub mod types;

pub use constants::*;
pub use params::*;
pub use serialization::*;
pub use types::*;

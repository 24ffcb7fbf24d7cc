// Consensus-critical. Changes require spec update + tests.
//! Deterministic graph construction from a header-derived seed.
//!
//! Two grid-size selectors and two edge generators exist; the verifier
//! picks a pair by header time. V1 reads hex digits of the seed's textual
//! form; V2 draws bits from an MT19937-64 stream keyed on the seed's low
//! 64 bits. Both are deterministic given seed and grid size.

use rand_mt::Mt64;
use shaihive_core::{Hash32, CYCLE_SLOTS, MIN_GRAPH_SIZE};

/// Undirected graph as a flat boolean adjacency matrix.
///
/// Always symmetric with a zero diagonal.
#[derive(Clone, Debug)]
pub struct Graph {
    n: usize,
    adj: Vec<bool>,
}

impl Graph {
    fn new(n: usize) -> Self {
        Self { n, adj: vec![false; n * n] }
    }

    /// Number of vertices.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Whether vertices `i` and `j` are adjacent.
    ///
    /// Out-of-range indices are simply non-adjacent.
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && self.adj[i * self.n + j]
    }

    fn set_edge(&mut self, i: usize, j: usize) {
        self.adj[i * self.n + j] = true;
        self.adj[j * self.n + i] = true;
    }

    /// Hand-built graph for solver/verifier tests.
    #[cfg(test)]
    pub(crate) fn with_vertices(n: usize) -> Self {
        Self::new(n)
    }

    /// Insert an undirected edge in a hand-built test graph.
    #[cfg(test)]
    pub(crate) fn insert_edge(&mut self, i: usize, j: usize) {
        self.set_edge(i, j);
    }
}

fn hex_digit(c: u8) -> u32 {
    match c {
        b'0'..=b'9' => u32::from(c - b'0'),
        b'a'..=b'f' => u32::from(c - b'a') + 10,
        _ => 0,
    }
}

fn leading_hex(seed: &Hash32, digits: usize) -> u64 {
    seed.to_string()
        .bytes()
        .take(digits)
        .fold(0u64, |acc, c| (acc << 4) | u64::from(hex_digit(c)))
}

/// Grid-size selector for PoW variants V1 and V2.
///
/// Maps the seed's first four hex digits onto 1480 segments above the
/// 512-vertex floor; the segment width is computed in floating point
/// exactly as the original does.
pub fn grid_size_v1(seed: &Hash32) -> u16 {
    const SEGMENTS: u64 = 1480;
    let g = leading_hex(seed, 4);
    let step = (CYCLE_SLOTS - MIN_GRAPH_SIZE) as f64 / SEGMENTS as f64;
    MIN_GRAPH_SIZE as u16 + ((g % SEGMENTS) as f64 * step) as u16
}

/// Grid-size selector for PoW variant V3.
///
/// The interval is degenerate (its floor sits above the slot ceiling), so
/// the clamp always wins and every V3 graph has 1992 vertices. Preserved
/// verbatim to match on-chain blocks.
pub fn grid_size_v2(seed: &Hash32) -> u16 {
    const FLOOR: i64 = 2000;
    const CEILING: i64 = CYCLE_SLOTS as i64;
    let g = leading_hex(seed, 8) as i64;
    CEILING.min(FLOOR + g % (CEILING - FLOOR)) as u16
}

/// Edge generation for PoW variants V1 and V2.
///
/// Each vertex pair indexes a hex-digit pair of the seed's 64-character
/// textual form; the pair's byte value decides the edge with probability
/// one half.
pub fn generate_graph(seed: &Hash32, grid_size: u16) -> Graph {
    let hex = seed.to_string().into_bytes();
    let len = hex.len();
    let n = grid_size as usize;
    let mut graph = Graph::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let idx = (i * n + j) * 2 % len;
            let edge = (hex_digit(hex[idx]) << 4) | hex_digit(hex[(idx + 1) % len]);
            if edge < 128 {
                graph.set_edge(i, j);
            }
        }
    }
    graph
}

/// Edge generation for PoW variant V3.
///
/// An MT19937-64 stream keyed on the seed's little-endian low 64 bits is
/// read as 32-bit words (the low half of each output), bits consumed most
/// significant first, one bit per vertex pair in lexicographic order.
pub fn generate_graph_v2(seed: &Hash32, grid_size: u16) -> Graph {
    let mut key = [0u8; 8];
    key.copy_from_slice(&seed.as_bytes()[..8]);
    let mut rng = Mt64::new(u64::from_le_bytes(key));

    let n = grid_size as usize;
    let mut graph = Graph::new(n);
    let mut word: u32 = 0;
    let mut bits_left = 0u32;
    for i in 0..n {
        for j in (i + 1)..n {
            if bits_left == 0 {
                word = rng.next_u64() as u32;
                bits_left = 32;
            }
            if word & 0x8000_0000 != 0 {
                graph.set_edge(i, j);
            }
            word <<= 1;
            bits_left -= 1;
        }
    }
    graph
}

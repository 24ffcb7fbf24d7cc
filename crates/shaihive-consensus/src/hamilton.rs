// Consensus-critical. Changes require spec update + tests.
//! Hamiltonian-cycle search and verification.
//!
//! The verifier is the consensus side: it accepts a solution iff the
//! recorded vertices are a permutation of the graph starting at vertex 0
//! and consecutive entries (cyclically) are adjacent. The solver is
//! producer-side only; it abandons the search once its wall-clock budget
//! is spent, a policy verifiers must never apply.

use crate::graph::Graph;
use shaihive_core::{CycleSolution, CYCLE_SLOTS};
use std::time::{Duration, Instant};

/// How many search steps pass between wall-clock checks.
const DEADLINE_CHECK_MASK: u64 = 0x3ff;

/// Verify a candidate cycle against a graph.
pub fn verify_hamiltonian_cycle(graph: &Graph, cycle: &CycleSolution) -> bool {
    let n = graph.size();
    let words = cycle.as_words();

    // All vertices exactly once, anchored at 0.
    if cycle.len() != n || n == 0 {
        return false;
    }
    if words[0] != 0 {
        return false;
    }
    let mut seen = vec![false; n];
    for &word in &words[..n] {
        let v = word as usize;
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }

    // Consecutive entries must be adjacent, and the path must close.
    for i in 1..n {
        if !graph.has_edge(words[i - 1] as usize, words[i] as usize) {
            return false;
        }
    }
    graph.has_edge(words[n - 1] as usize, words[0] as usize)
}

/// Search for a Hamiltonian cycle, giving up once `budget` has elapsed.
///
/// Candidate vertices are tried in ascending order from a path anchored at
/// vertex 0, mirroring the recursive original; the recursion is flattened
/// onto an explicit stack so the search depth never threatens the thread
/// stack.
pub fn find_hamiltonian_cycle(graph: &Graph, budget: Duration) -> Option<CycleSolution> {
    let n = graph.size();
    if n < 2 || n > CYCLE_SLOTS {
        return None;
    }

    let started = Instant::now();
    let mut path: Vec<u16> = Vec::with_capacity(n);
    path.push(0);
    let mut used = vec![false; n];
    used[0] = true;
    // cursor[d] is the next candidate vertex to try at depth d.
    let mut cursor: Vec<u16> = vec![1; n + 1];
    let mut depth = 1usize;
    let mut steps = 0u64;

    loop {
        steps += 1;
        if steps & DEADLINE_CHECK_MASK == 0 && started.elapsed() > budget {
            return None;
        }

        if depth == n {
            if graph.has_edge(path[n - 1] as usize, 0) {
                return Some(CycleSolution::from_path(&path));
            }
            // Not closable: undo the last choice and keep scanning.
            depth -= 1;
            if let Some(v) = path.pop() {
                used[v as usize] = false;
            }
            continue;
        }

        let prev = path[depth - 1] as usize;
        let mut advanced = false;
        let mut v = cursor[depth] as usize;
        while v < n {
            if !used[v] && graph.has_edge(prev, v) {
                cursor[depth] = (v + 1) as u16;
                path.push(v as u16);
                used[v] = true;
                depth += 1;
                cursor[depth] = 1;
                advanced = true;
                break;
            }
            v += 1;
        }

        if !advanced {
            if depth == 1 {
                return None;
            }
            depth -= 1;
            if let Some(v) = path.pop() {
                used[v as usize] = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{generate_graph, grid_size_v1};
    use shaihive_core::{sha256, CycleSolution};

    /// Ring over `n` vertices plus the given chords.
    fn ring(n: usize, chords: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::with_vertices(n);
        for i in 0..n {
            graph.insert_edge(i, (i + 1) % n);
        }
        for &(i, j) in chords {
            graph.insert_edge(i, j);
        }
        graph
    }

    fn solution(path: &[u16]) -> CycleSolution {
        CycleSolution::from_path(path)
    }

    #[test]
    fn accepts_simple_ring() {
        let graph = ring(5, &[]);
        assert!(verify_hamiltonian_cycle(&graph, &solution(&[0, 1, 2, 3, 4])));
        // Either orientation is a cycle.
        assert!(verify_hamiltonian_cycle(&graph, &solution(&[0, 4, 3, 2, 1])));
    }

    #[test]
    fn rejects_wrong_anchor() {
        let graph = ring(5, &[]);
        assert!(!verify_hamiltonian_cycle(&graph, &solution(&[1, 2, 3, 4, 0])));
    }

    #[test]
    fn rejects_wrong_length() {
        let graph = ring(5, &[]);
        assert!(!verify_hamiltonian_cycle(&graph, &solution(&[0, 1, 2, 3])));
        assert!(!verify_hamiltonian_cycle(&graph, &solution(&[0, 1, 2, 3, 4, 4])));
        assert!(!verify_hamiltonian_cycle(&graph, &CycleSolution::empty()));
    }

    #[test]
    fn rejects_duplicates_and_out_of_range() {
        let graph = ring(5, &[]);
        assert!(!verify_hamiltonian_cycle(&graph, &solution(&[0, 1, 2, 1, 4])));
        assert!(!verify_hamiltonian_cycle(&graph, &solution(&[0, 1, 2, 3, 7])));
    }

    #[test]
    fn rejects_interleaved_sentinels() {
        let graph = ring(5, &[]);
        // A sentinel inside the path truncates it below the graph size.
        let mut words = [shaihive_core::CYCLE_SENTINEL; shaihive_core::CYCLE_SLOTS];
        words[0] = 0;
        words[1] = 1;
        words[2] = shaihive_core::CYCLE_SENTINEL;
        words[3] = 2;
        words[4] = 3;
        words[5] = 4;
        assert!(!verify_hamiltonian_cycle(&graph, &CycleSolution(words)));
    }

    #[test]
    fn rejects_missing_edge() {
        // Path graph (ring with one edge removed) has no Hamiltonian cycle.
        let mut graph = Graph::with_vertices(5);
        for i in 0..4 {
            graph.insert_edge(i, i + 1);
        }
        assert!(!verify_hamiltonian_cycle(&graph, &solution(&[0, 1, 2, 3, 4])));
    }

    #[test]
    fn solver_finds_ring_cycle() {
        let graph = ring(8, &[]);
        let cycle = find_hamiltonian_cycle(&graph, Duration::from_secs(1)).unwrap();
        assert!(verify_hamiltonian_cycle(&graph, &cycle));
        assert_eq!(cycle.len(), 8);
    }

    #[test]
    fn solver_prefers_ascending_candidates() {
        // On a complete graph the first branch taken is 0,1,2,..,n-1.
        let mut graph = Graph::with_vertices(6);
        for i in 0..6 {
            for j in (i + 1)..6 {
                graph.insert_edge(i, j);
            }
        }
        let cycle = find_hamiltonian_cycle(&graph, Duration::from_secs(1)).unwrap();
        assert_eq!(&cycle.as_words()[..6], &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn solver_reports_no_cycle() {
        // Star graph: every edge passes through the hub, no cycle exists.
        let mut graph = Graph::with_vertices(6);
        for leaf in 1..6 {
            graph.insert_edge(0, leaf);
        }
        assert!(find_hamiltonian_cycle(&graph, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn solver_backtracks_through_dead_ends() {
        // The only Hamiltonian cycle is 0-2-4-1-3-0, but the decoy edge
        // 0-1 makes the ascending search walk into dead ends first.
        let mut graph = Graph::with_vertices(5);
        for &(i, j) in &[(0, 1), (0, 2), (2, 4), (4, 1), (1, 3), (3, 0)] {
            graph.insert_edge(i, j);
        }
        let cycle = find_hamiltonian_cycle(&graph, Duration::from_secs(1)).unwrap();
        assert!(verify_hamiltonian_cycle(&graph, &cycle));
        assert_eq!(&cycle.as_words()[..5], &[0, 2, 4, 1, 3]);
    }

    #[test]
    fn cycle_at_minimum_grid_size() {
        // An all-zero seed yields edge value 0 for every pair: a complete
        // graph at the 512-vertex floor, solved by the ascending walk.
        let graph = generate_graph(&shaihive_core::Hash32::zero(), 512);
        let cycle = find_hamiltonian_cycle(&graph, Duration::from_secs(3)).unwrap();
        assert_eq!(cycle.len(), 512);
        assert!(verify_hamiltonian_cycle(&graph, &cycle));
    }

    #[test]
    fn solver_handles_pow_scale_graphs() {
        // A realistically sized half-density graph from the V1 generator.
        let seed = sha256(b"solver-scale");
        let graph = generate_graph(&seed, grid_size_v1(&seed));
        let cycle = find_hamiltonian_cycle(&graph, Duration::from_secs(3));
        if let Some(cycle) = cycle {
            assert!(verify_hamiltonian_cycle(&graph, &cycle));
        }
    }

    #[test]
    fn solver_respects_budget() {
        // Two cliques sharing a single cut vertex: no Hamiltonian cycle
        // exists, and exhausting the search would take astronomically
        // long, so only the deadline can end it.
        let mut graph = Graph::with_vertices(64);
        for i in 0..=32 {
            for j in (i + 1)..=32 {
                graph.insert_edge(i, j);
            }
        }
        for i in 32..64 {
            for j in (i + 1)..64 {
                graph.insert_edge(i, j);
            }
        }
        let started = Instant::now();
        assert!(find_hamiltonian_cycle(&graph, Duration::from_millis(50)).is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

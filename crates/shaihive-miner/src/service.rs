//! The mining service: a worker pool scanning nonces for cycle solutions.
//!
//! One worker runs per detected core, plus a telemetry thread that turns
//! the shared attempt counter into a hash rate. Workers share only the
//! `should_mine` flag, the counters, and the chain manager (which
//! serializes internally); everything else is thread-local. Cancellation
//! is cooperative and checked at loop boundaries.

use crate::chain::{ChainManager, TemplateAssembler};
use shaihive_consensus::{bits_to_target, find_hamiltonian_cycle, hash_meets_target, PowVariant};
use shaihive_core::{block_hash, body_sha256, Amount, BlockHeader, ChainParams, ChainType};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Seconds between telemetry reports.
const TELEMETRY_INTERVAL_SECS: u64 = 5;

/// How long a worker keeps scanning one template before refreshing it.
fn template_timeout(variant: PowVariant) -> Duration {
    match variant {
        PowVariant::V1 => Duration::from_secs(60),
        PowVariant::V2 | PowVariant::V3 => Duration::from_secs(15),
    }
}

enum ScanOutcome {
    Found,
    Abandoned,
}

struct Shared {
    params: ChainParams,
    chain: Arc<dyn ChainManager>,
    assembler: Arc<dyn TemplateAssembler>,
    should_mine: AtomicBool,
    total_hashes: AtomicU64,
    hash_rate: AtomicU64,
}

/// Owns the mining workers and their shared state.
///
/// Dropping the service stops and joins all workers.
pub struct MinerService {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl MinerService {
    /// Create a stopped service over the given seams.
    pub fn new(
        params: ChainParams,
        chain: Arc<dyn ChainManager>,
        assembler: Arc<dyn TemplateAssembler>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                params,
                chain,
                assembler,
                should_mine: AtomicBool::new(false),
                total_hashes: AtomicU64::new(0),
                hash_rate: AtomicU64::new(0),
            }),
            workers: Vec::new(),
        }
    }

    /// Restart mining toward `miner_script`, or stop every worker when no
    /// script is supplied.
    ///
    /// The restart is atomic: existing workers are stopped and joined
    /// before any new worker spawns.
    pub fn start(&mut self, miner_script: Option<Vec<u8>>) {
        self.stop();

        let Some(script) = miner_script else {
            return;
        };

        self.shared.should_mine.store(true, Ordering::SeqCst);

        let threads = thread::available_parallelism().map(usize::from).unwrap_or(1);
        for index in 0..threads {
            let shared = Arc::clone(&self.shared);
            let script = script.clone();
            let spawned = thread::Builder::new()
                .name(format!("shaihive-miner-{index}"))
                .spawn(move || worker_loop(&shared, &script));
            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(err) => log::error!("failed to spawn mining worker: {err}"),
            }
        }

        let shared = Arc::clone(&self.shared);
        let telemetry = thread::Builder::new()
            .name("shaihive-miner-telemetry".into())
            .spawn(move || telemetry_loop(&shared));
        match telemetry {
            Ok(handle) => self.workers.push(handle),
            Err(err) => log::error!("failed to spawn telemetry thread: {err}"),
        }
    }

    /// Stop and join every worker.
    pub fn stop(&mut self) {
        self.shared.should_mine.store(false, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// Most recent measured hash rate in attempts per second.
    pub fn hash_rate(&self) -> u64 {
        self.shared.hash_rate.load(Ordering::Relaxed)
    }

    /// Whether workers are currently running.
    pub fn is_mining(&self) -> bool {
        self.shared.should_mine.load(Ordering::SeqCst)
    }
}

impl Drop for MinerService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &Shared, script: &[u8]) {
    log::info!("mining worker started");

    while shared.should_mine.load(Ordering::SeqCst) {
        // Busy-wait for the network to come online so we don't waste time
        // mining on an obsolete chain. Regtest has no peers to wait for.
        if shared.params.chain != ChainType::Regtest {
            while shared.should_mine.load(Ordering::SeqCst) {
                if shared.chain.node_count() > 0 && !shared.chain.is_initial_block_download() {
                    break;
                }
                log::debug!("waiting for peers");
                thread::sleep(Duration::from_secs(1));
            }
            if !shared.should_mine.load(Ordering::SeqCst) {
                break;
            }
        }

        let Some(tip) = shared.chain.tip() else {
            log::error!("no active tip; mining worker stopping");
            break;
        };

        let Some(template) = shared.assembler.create_new_block(script) else {
            shared.should_mine.store(false, Ordering::SeqCst);
            log::error!("block template unavailable (keypool empty?); stopping all workers");
            break;
        };

        let mut header = template.header;
        if header.prev != tip.hash {
            // The tip moved between the snapshot and assembly; refresh.
            continue;
        }

        if let ScanOutcome::Found = scan_for_block(shared, &mut header) {
            submit(shared, header, template.coinbase_value);
        }
    }

    log::info!("mining worker ended");
}

/// Scan nonces under one template until the composite proof holds, the
/// template goes stale, or its time budget runs out.
fn scan_for_block(shared: &Shared, header: &mut BlockHeader) -> ScanOutcome {
    let variant = PowVariant::for_time(header.time, &shared.params);
    let budget = template_timeout(variant);
    let started = Instant::now();

    let Ok(target) = bits_to_target(header.bits) else {
        // A malformed template target is fatal misconfiguration.
        log::error!("template carries malformed difficulty bits 0x{:08x}", header.bits);
        shared.should_mine.store(false, Ordering::SeqCst);
        return ScanOutcome::Abandoned;
    };

    let mut nonce: u32 = rand::random();

    while shared.should_mine.load(Ordering::SeqCst) {
        nonce = nonce.wrapping_add(1);
        header.nonce = nonce;
        shared.total_hashes.fetch_add(1, Ordering::Relaxed);

        let Ok(body) = body_sha256(header) else {
            return ScanOutcome::Abandoned;
        };
        let seed = variant.graph_seed(&body);
        let graph = variant.build_graph(&seed);

        if let Some(cycle) = find_hamiltonian_cycle(&graph, variant.solver_budget()) {
            header.cycle = cycle;
            if let Ok(hash) = block_hash(header) {
                if hash_meets_target(&hash, &target) {
                    return ScanOutcome::Found;
                }
            }
        }

        // Staleness: the tip moved under us, or the template aged out.
        match shared.chain.tip() {
            Some(tip) if tip.hash == header.prev => {}
            _ => return ScanOutcome::Abandoned,
        }
        if started.elapsed() > budget {
            return ScanOutcome::Abandoned;
        }
    }

    ScanOutcome::Abandoned
}

fn submit(shared: &Shared, mut header: BlockHeader, coinbase_value: Amount) {
    // The tip may have moved while the scan was finishing.
    match shared.chain.tip() {
        Some(tip) if tip.hash == header.prev => {}
        _ => return,
    }

    if let Some(prev) = shared.chain.lookup(&header.prev) {
        shared
            .chain
            .update_uncommitted_block_structures(&mut header, &prev);
    }

    let Ok(hash) = block_hash(&header) else {
        return;
    };

    if shared.chain.process_new_block(&header) {
        log::info!(
            "proof-of-work found: hash={hash} bits=0x{:08x} generated {coinbase_value}",
            header.bits
        );
    } else {
        log::warn!("mined block {hash} rejected by chain manager");
    }
}

fn telemetry_loop(shared: &Shared) {
    let mut ticks = 0u64;
    while shared.should_mine.load(Ordering::SeqCst) {
        // Sleep in short steps so stop() never waits a full interval.
        thread::sleep(Duration::from_millis(500));
        ticks += 1;
        if ticks % (TELEMETRY_INTERVAL_SECS * 2) == 0 {
            let hashes = shared.total_hashes.swap(0, Ordering::Relaxed);
            let rate = hashes / TELEMETRY_INTERVAL_SECS;
            shared.hash_rate.store(rate, Ordering::Relaxed);
            log::info!("hash rate: {rate} H/s");
        }
    }
}

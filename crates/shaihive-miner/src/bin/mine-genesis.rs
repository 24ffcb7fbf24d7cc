// Utility to mine a fresh genesis block for a chosen network.
use shaihive_consensus::{bits_to_target, find_hamiltonian_cycle, hash_meets_target, PowVariant};
use shaihive_core::{
    block_hash, body_sha256, BlockHeader, ChainParams, CycleSolution, Hash32, RegTestOptions,
    SigNetOptions,
};
use std::time::Instant;

fn main() {
    let mut args = std::env::args().skip(1);
    let network = args.next().unwrap_or_else(|| "regtest".to_string());
    let params = match network.as_str() {
        "main" => ChainParams::main(),
        "testnet" => ChainParams::testnet(),
        "signet" => ChainParams::signet(SigNetOptions::default()),
        "regtest" => ChainParams::regtest(RegTestOptions::default()),
        other => {
            eprintln!("unknown network: {other}");
            std::process::exit(1);
        }
    };
    let time: u32 = args
        .next()
        .map(|s| s.parse().expect("valid timestamp"))
        .unwrap_or(params.genesis.time);
    let merkle_root: Hash32 = args
        .next()
        .map(|s| s.parse().expect("valid merkle root hex"))
        .unwrap_or(Hash32::zero());

    println!("Mining {network} genesis block at timestamp {time}...");
    println!("merkle_root: {merkle_root}");

    let mut header = BlockHeader {
        version: params.genesis.version,
        prev: Hash32::zero(),
        merkle_root,
        time,
        bits: params.genesis.bits,
        nonce: 0,
        randomx_mix: None,
        cycle: CycleSolution::empty(),
    };

    let variant = PowVariant::for_time(header.time, &params);
    let target = bits_to_target(header.bits).expect("valid genesis bits");
    println!("Mining with difficulty bits: 0x{:08x} ({variant:?})", header.bits);

    let start = Instant::now();
    let mut attempts = 0u64;

    loop {
        attempts += 1;
        header.nonce = header.nonce.wrapping_add(1);

        let body = body_sha256(&header).expect("body hash");
        let seed = variant.graph_seed(&body);
        let graph = variant.build_graph(&seed);

        if let Some(cycle) = find_hamiltonian_cycle(&graph, variant.solver_budget()) {
            header.cycle = cycle;
            let hash = block_hash(&header).expect("block hash");
            if hash_meets_target(&hash, &target) {
                println!("\nFound valid genesis block!");
                println!("Time: {:.2}s over {attempts} attempts", start.elapsed().as_secs_f64());

                println!("\n==================================================");
                println!("Update the {network} entry in params.rs with:");
                println!("==================================================\n");
                println!("time: {},", header.time);
                println!("nonce: {},", header.nonce);
                println!("bits: 0x{:08x},", header.bits);
                println!("hash: Some(Hash32::literal(\n    \"{hash}\",\n)),");
                println!("merkle_root: Some(Hash32::literal(\n    \"{merkle_root}\",\n)),");
                println!("\ncycle ({} vertices):", header.cycle.len());
                let words = &header.cycle.as_words()[..header.cycle.len()];
                println!("{words:?}");
                break;
            }
        }

        if attempts % 100 == 0 {
            println!(
                "Attempts: {attempts} ({:.2} cycle searches/s)",
                attempts as f64 / start.elapsed().as_secs_f64()
            );
        }
    }
}

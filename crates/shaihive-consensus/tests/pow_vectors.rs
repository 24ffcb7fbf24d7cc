use serde::Deserialize;
use shaihive_consensus::pow_limit_compact;
use shaihive_core::{cycle_hash, ChainParams, Hash32};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct CycleVector {
    name: String,
    comment: String,
    cycle: Vec<u16>,
    block_hash_hex: String,
}

fn vectors_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("vectors")
        .join("genesis_cycle.json")
}

#[test]
fn genesis_cycle_hash_vectors() {
    let data = fs::read_to_string(vectors_path()).expect("vector file");
    let vectors: Vec<CycleVector> = serde_json::from_str(&data).expect("parse json");
    assert!(!vectors.is_empty());

    for v in vectors {
        let hash = cycle_hash(&v.cycle).expect("hash");
        assert_eq!(
            hash.to_string(),
            v.block_hash_hex,
            "cycle hash mismatch for {}",
            v.name
        );
    }
}

#[test]
fn main_genesis_constants_pinned() {
    let params = ChainParams::main();
    let genesis = &params.genesis;

    assert_eq!(genesis.time, 1_722_343_420);
    assert_eq!(genesis.nonce, 3_146_876_148);
    assert_eq!(genesis.bits, 0x1f7f_ffff);
    assert_eq!(genesis.reward.atoms(), 11 * 100_000_000);

    let expected: Hash32 = "005bf9ad68a610dee37ed5548a963ab9727df30f000085d02992ee2aac010c27"
        .parse()
        .expect("hash");
    assert_eq!(genesis.hash, Some(expected));

    let merkle: Hash32 = "2a9f2576a15e81773726f78378842567276e3b43860290adfe30d113ca6cef76"
        .parse()
        .expect("hash");
    assert_eq!(genesis.merkle_root, Some(merkle));

    // The genesis bits are exactly the network's easiest target.
    assert_eq!(pow_limit_compact(&params).expect("compact"), genesis.bits);
}

#[test]
fn genesis_vector_matches_pinned_checkpoint() {
    let data = fs::read_to_string(vectors_path()).expect("vector file");
    let vectors: Vec<CycleVector> = serde_json::from_str(&data).expect("parse json");
    let main = vectors
        .iter()
        .find(|v| v.name == "main-genesis-first-revision")
        .expect("main vector present");

    let pinned = ChainParams::main().genesis.hash.expect("pinned hash");
    assert_eq!(pinned.to_string(), main.block_hash_hex);
}

//! Per-network chain parameters.
//!
//! The four networks are variants of one read-only configuration record,
//! constructed once and shared by const reference; consuming code only
//! needs field access. Values follow the latest main-network revision.

use crate::constants::COIN;
use crate::serialization::sha256;
use crate::types::{Amount, BlockHash, Hash32};
use core::fmt;

/// No extra script verification flags.
pub const SCRIPT_VERIFY_NONE: u32 = 0;
/// Evaluate pay-to-script-hash.
pub const SCRIPT_VERIFY_P2SH: u32 = 1 << 0;
/// Evaluate witness programs.
pub const SCRIPT_VERIFY_WITNESS: u32 = 1 << 11;

/// The default signet challenge script.
const DEFAULT_SIGNET_CHALLENGE: &[u8] = &[
    0x51, 0x21, 0x03, 0xad, 0x5e, 0x0e, 0xda, 0xd1, 0x8c, 0xb1, 0xf0, 0xfc, 0x0d, 0x28, 0xa3,
    0xd4, 0xf1, 0xf3, 0xe4, 0x45, 0x64, 0x03, 0x37, 0x48, 0x9a, 0xbb, 0x10, 0x40, 0x4f, 0x2d,
    0x1e, 0x08, 0x6b, 0xe4, 0x30, 0x21, 0x03, 0x59, 0xef, 0x50, 0x21, 0x96, 0x4f, 0xe2, 0x2d,
    0x6f, 0x8e, 0x05, 0xb2, 0x46, 0x3c, 0x95, 0x40, 0xce, 0x96, 0x88, 0x3f, 0xe3, 0xb2, 0x78,
    0x76, 0x0f, 0x04, 0x8f, 0x51, 0x89, 0xf2, 0xe6, 0xc4, 0x52, 0xae,
];

/// Network identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChainType {
    /// Main network on which people trade goods and services.
    Main,
    /// Public test network, reset from time to time.
    Testnet,
    /// Test network with a signed-block challenge parameter.
    Signet,
    /// Regression test: private networks with instant blocks.
    Regtest,
}

impl ChainType {
    /// Short lowercase network name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChainType::Main => "main",
            ChainType::Testnet => "testnet",
            ChainType::Signet => "signet",
            ChainType::Regtest => "regtest",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which difficulty controller a network runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RetargetAlgo {
    /// Single-interval controller (variant by height, see the consensus crate).
    Interval,
    /// PID controller over a four-block window.
    Pid,
}

/// Base58 address version bytes.
#[derive(Clone, Copy, Debug)]
pub struct Base58Prefixes {
    /// Pay-to-pubkey-hash address version.
    pub p2pkh: u8,
    /// Pay-to-script-hash address version.
    pub p2sh: u8,
    /// Wallet-import-format secret key version.
    pub wif: u8,
}

/// Genesis block constants for a network.
///
/// The cycle array itself is chain data loaded from the block store; the
/// hash and merkle root are pinned here as checkpoints where the network
/// has a canonical chain.
#[derive(Clone, Debug)]
pub struct GenesisParams {
    /// Header version.
    pub version: i32,
    /// Header timestamp.
    pub time: u32,
    /// Header nonce.
    pub nonce: u32,
    /// Compact target.
    pub bits: u32,
    /// Coinbase reward. The genesis output is not indexed in the UTXO set
    /// and cannot be spent.
    pub reward: Amount,
    /// Pinned block hash, when the network has a canonical chain.
    pub hash: Option<BlockHash>,
    /// Pinned merkle root, when the network has a canonical chain.
    pub merkle_root: Option<Hash32>,
}

/// Assume-UTXO snapshot descriptor. Opaque to the PoW subsystem.
#[derive(Clone, Debug)]
pub struct AssumeUtxo {
    /// Snapshot height.
    pub height: u32,
    /// Hash of the serialized UTXO set.
    pub hash_serialized: Hash32,
    /// Transaction count up to and including the snapshot block.
    pub chain_tx_count: u64,
    /// Hash of the snapshot block.
    pub block_hash: BlockHash,
}

/// Caller-tunable signet construction.
#[derive(Clone, Debug, Default)]
pub struct SigNetOptions {
    /// Block challenge script; the default network challenge when `None`.
    pub challenge: Option<Vec<u8>>,
    /// Seed list override.
    pub seeds: Option<Vec<String>>,
}

/// Caller-tunable regtest construction.
#[derive(Clone, Debug, Default)]
pub struct RegTestOptions {
    /// Override for the V1 -> V2 proof-of-work switch time.
    pub pow_v2_switch_time: Option<u32>,
    /// Override for the V2 -> V3 proof-of-work switch time.
    pub pow_v3_switch_time: Option<u32>,
    /// Override for the retarget variant switch height.
    pub retarget_v2_switch_height: Option<u32>,
}

/// Read-only consensus and network constants for one chain.
#[derive(Clone, Debug)]
pub struct ChainParams {
    /// Which network this record describes.
    pub chain: ChainType,
    /// P2P message start bytes.
    pub message_start: [u8; 4],
    /// Default P2P listen port.
    pub default_port: u16,
    /// Highest (easiest) permitted target.
    pub pow_limit: Hash32,
    /// Desired seconds between blocks.
    pub target_spacing: u64,
    /// Retarget observation window in seconds.
    ///
    /// The main network sets this equal to `target_spacing`: the
    /// controller reacts every block, so the window is a single block.
    pub target_timespan: u64,
    /// Whether a long gap permits a minimum-difficulty block.
    pub allow_min_difficulty_blocks: bool,
    /// Whether retargeting is disabled entirely.
    pub no_retargeting: bool,
    /// Height at which the constant tail-emission subsidy begins.
    pub tail_emission_block_height: u32,
    /// Header time bounding proof-of-work variant V1 (inclusive).
    pub pow_v2_switch_time: u32,
    /// Header time bounding proof-of-work variant V2 (inclusive).
    pub pow_v3_switch_time: u32,
    /// Tip height from which the retarget measures the tip-to-parent
    /// interval instead of candidate-to-tip.
    pub retarget_v2_switch_height: u32,
    /// Difficulty controller selection.
    pub retarget: RetargetAlgo,
    /// Block hashes whose ancillary script verification flags are relaxed.
    pub script_flag_exceptions: Vec<(BlockHash, u32)>,
    /// Base58 address version bytes.
    pub base58_prefixes: Base58Prefixes,
    /// Bech32 human-readable part.
    pub bech32_hrp: &'static str,
    /// DNS seeds used to bootstrap the address book. Not consensus-critical.
    pub dns_seeds: Vec<String>,
    /// Genesis constants.
    pub genesis: GenesisParams,
    /// Assume-UTXO snapshots.
    pub assume_utxo: Vec<AssumeUtxo>,
    /// Signet block challenge, when this is a signet.
    pub signet_challenge: Option<Vec<u8>>,
}

impl ChainParams {
    /// Main network parameters.
    pub fn main() -> Self {
        Self {
            chain: ChainType::Main,
            // Rarely used upper ASCII, not valid as UTF-8.
            message_start: [0xe4, 0x3a, 0x7c, 0xd1],
            default_port: 42069,
            pow_limit: Hash32::literal(
                "007fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            ),
            target_spacing: 2 * 60,
            // Equals the spacing: a one-block retarget window.
            target_timespan: 2 * 60,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            tail_emission_block_height: 420_480,
            pow_v2_switch_time: 1_723_869_065,
            pow_v3_switch_time: 1_726_799_420,
            retarget_v2_switch_height: 4350,
            retarget: RetargetAlgo::Interval,
            script_flag_exceptions: vec![
                (
                    Hash32::literal(
                        "00000000000002dc756eebf4f49723ed8d30cc28a5f108eb94b1ba88ac4f9c22",
                    ),
                    SCRIPT_VERIFY_NONE,
                ),
                (
                    Hash32::literal(
                        "0000000000000000000f14c35b2d841e986ab5441de8c585d5ffe55ea1e395ad",
                    ),
                    SCRIPT_VERIFY_P2SH | SCRIPT_VERIFY_WITNESS,
                ),
            ],
            base58_prefixes: Base58Prefixes { p2pkh: 137, p2sh: 135, wif: 117 },
            bech32_hrp: "sh",
            dns_seeds: vec!["seeder.shaihive.org.".into()],
            genesis: GenesisParams {
                version: 1,
                time: 1_722_343_420,
                nonce: 3_146_876_148,
                bits: 0x1f7f_ffff,
                reward: Amount::from_atoms(11 * COIN),
                hash: Some(Hash32::literal(
                    "005bf9ad68a610dee37ed5548a963ab9727df30f000085d02992ee2aac010c27",
                )),
                merkle_root: Some(Hash32::literal(
                    "2a9f2576a15e81773726f78378842567276e3b43860290adfe30d113ca6cef76",
                )),
            },
            assume_utxo: vec![],
            signet_challenge: None,
        }
    }

    /// Testnet parameters.
    pub fn testnet() -> Self {
        Self {
            chain: ChainType::Testnet,
            message_start: [0x0b, 0x11, 0x09, 0x3a],
            default_port: 18333,
            pow_limit: Hash32::literal(
                "0000ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            ),
            target_spacing: 5 * 60,
            target_timespan: 2 * 60 * 60,
            allow_min_difficulty_blocks: true,
            no_retargeting: false,
            tail_emission_block_height: 420_480,
            pow_v2_switch_time: 1_723_869_065,
            pow_v3_switch_time: 1_726_799_420,
            retarget_v2_switch_height: 4350,
            retarget: RetargetAlgo::Interval,
            script_flag_exceptions: vec![(
                Hash32::literal(
                    "00000000dd30457c001f4095d208cc1296b0eed002427aa599874af7a432b105",
                ),
                SCRIPT_VERIFY_NONE,
            )],
            base58_prefixes: Base58Prefixes { p2pkh: 111, p2sh: 196, wif: 239 },
            bech32_hrp: "tb",
            dns_seeds: vec![],
            genesis: GenesisParams {
                version: 1,
                time: 1_720_471_420,
                nonce: 2_157_475_185,
                bits: 0x1f00_ffff,
                reward: Amount::from_atoms(50 * COIN),
                hash: Some(Hash32::literal(
                    "007a91ae5fb2380bd8da591eccadaa4030bf4f84240089eba2a460bedcc3b723",
                )),
                merkle_root: Some(Hash32::literal(
                    "5b53a050a9980529aacc59a2e30e15f7540b6021d06da511d87e3e3d0e4f7644",
                )),
            },
            assume_utxo: vec![],
            signet_challenge: None,
        }
    }

    /// Signet parameters.
    pub fn signet(options: SigNetOptions) -> Self {
        let challenge = options
            .challenge
            .unwrap_or_else(|| DEFAULT_SIGNET_CHALLENGE.to_vec());
        let seeds = options
            .seeds
            .unwrap_or_else(|| vec!["seed.signet.shaihive.org.".into()]);

        // Message start is the first four bytes of the challenge digest.
        let digest = sha256(&challenge);
        let mut message_start = [0u8; 4];
        message_start.copy_from_slice(&digest.as_bytes()[..4]);

        Self {
            chain: ChainType::Signet,
            message_start,
            default_port: 38333,
            pow_limit: Hash32::literal(
                "00000377ae000000000000000000000000000000000000000000000000000000",
            ),
            target_spacing: 10 * 60,
            target_timespan: 14 * 24 * 60 * 60,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            tail_emission_block_height: 210_000,
            pow_v2_switch_time: 1_723_869_065,
            pow_v3_switch_time: 1_726_799_420,
            retarget_v2_switch_height: 4350,
            retarget: RetargetAlgo::Interval,
            script_flag_exceptions: vec![],
            base58_prefixes: Base58Prefixes { p2pkh: 111, p2sh: 196, wif: 239 },
            bech32_hrp: "tb",
            dns_seeds: seeds,
            genesis: GenesisParams {
                version: 1,
                time: 1_598_918_400,
                nonce: 52_613_770,
                bits: 0x1e03_77ae,
                reward: Amount::from_atoms(50 * COIN),
                hash: None,
                merkle_root: None,
            },
            assume_utxo: vec![AssumeUtxo {
                height: 160_000,
                hash_serialized: Hash32::literal(
                    "fe0a44309b74d6b5883d246cb419c6221bcccf0b308c9b59b7d70783dbdf928a",
                ),
                chain_tx_count: 2_289_496,
                block_hash: Hash32::literal(
                    "0000003ca3c99aff040f2563c2ad8f8ec88bd0fd6b8f0895cfaf1ef90353a62c",
                ),
            }],
            signet_challenge: Some(challenge),
        }
    }

    /// Regtest parameters.
    pub fn regtest(options: RegTestOptions) -> Self {
        Self {
            chain: ChainType::Regtest,
            message_start: [0xfa, 0xbf, 0xb5, 0xda],
            default_port: 18444,
            pow_limit: Hash32::literal(
                "7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            ),
            target_spacing: 10 * 60,
            target_timespan: 14 * 24 * 60 * 60,
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
            tail_emission_block_height: 150,
            pow_v2_switch_time: options.pow_v2_switch_time.unwrap_or(1_723_869_065),
            pow_v3_switch_time: options.pow_v3_switch_time.unwrap_or(1_726_799_420),
            retarget_v2_switch_height: options.retarget_v2_switch_height.unwrap_or(4350),
            retarget: RetargetAlgo::Interval,
            script_flag_exceptions: vec![],
            base58_prefixes: Base58Prefixes { p2pkh: 111, p2sh: 196, wif: 239 },
            bech32_hrp: "bcrt",
            dns_seeds: vec!["dummySeed.invalid.".into()],
            genesis: GenesisParams {
                version: 1,
                time: 1_296_688_602,
                nonce: 2,
                bits: 0x207f_ffff,
                reward: Amount::from_atoms(50 * COIN),
                hash: None,
                merkle_root: None,
            },
            assume_utxo: vec![
                AssumeUtxo {
                    height: 110,
                    hash_serialized: Hash32::literal(
                        "6657b736d4fe4db0cbc796789e812d5dba7f5c143764b1b6905612f1830609d1",
                    ),
                    chain_tx_count: 111,
                    block_hash: Hash32::literal(
                        "696e92821f65549c7ee134edceeeeaaa4105647a3c4fd9f298c0aec0ab50425c",
                    ),
                },
                AssumeUtxo {
                    height: 299,
                    hash_serialized: Hash32::literal(
                        "a4bf3407ccb2cc0145c49ebba8fa91199f8a3903daf0883875941497d2493c27",
                    ),
                    chain_tx_count: 334,
                    block_hash: Hash32::literal(
                        "3bb7ce5eba0be48939b7a521ac1ba9316afee2c7bada3a0cca24188e6d7d96c0",
                    ),
                },
            ],
            signet_challenge: None,
        }
    }

    /// Script verification flag relaxation for a given block hash.
    pub fn script_flag_exception(&self, hash: &BlockHash) -> Option<u32> {
        self.script_flag_exceptions
            .iter()
            .find(|(h, _)| h == hash)
            .map(|(_, flags)| *flags)
    }
}

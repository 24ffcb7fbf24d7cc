//! Seams toward the surrounding node.
//!
//! The miner drives block production but owns no chain state; the chain
//! manager serializes tip access and block acceptance internally, and the
//! template assembler builds candidate blocks (its headers arrive with the
//! merkle root already recomputed).

use shaihive_consensus::ChainTip;
use shaihive_core::{Amount, BlockHash, BlockHeader};

/// A candidate block handed to the miner.
#[derive(Clone, Debug)]
pub struct BlockTemplate {
    /// Header to scan; `cycle` arrives empty.
    pub header: BlockHeader,
    /// Value of the coinbase output, for operator telemetry.
    pub coinbase_value: Amount,
}

/// Chain state access used by the mining loop.
pub trait ChainManager: Send + Sync {
    /// Snapshot of the active tip, `None` before genesis is loaded.
    fn tip(&self) -> Option<ChainTip>;

    /// Look up a block by hash.
    fn lookup(&self, hash: &BlockHash) -> Option<ChainTip>;

    /// Refresh commitments that depend on the previous block.
    fn update_uncommitted_block_structures(&self, header: &mut BlockHeader, prev: &ChainTip);

    /// Submit a freshly mined block. Returns whether it was accepted.
    fn process_new_block(&self, header: &BlockHeader) -> bool;

    /// Number of connected peers.
    fn node_count(&self) -> usize;

    /// Whether the node is still in initial block download.
    fn is_initial_block_download(&self) -> bool;
}

/// Block-template construction.
pub trait TemplateAssembler: Send + Sync {
    /// Assemble a candidate block paying the given script.
    ///
    /// `None` signals that no template can be produced (for example an
    /// exhausted keypool); the miner treats that as fatal.
    fn create_new_block(&self, miner_script: &[u8]) -> Option<BlockTemplate>;
}

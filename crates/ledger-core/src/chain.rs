use serde::Serialize;
use tracing::{debug, warn};

use crate::block::Block;
use crate::config::ChainConfig;
use crate::constants::{GENESIS_DATA, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
use crate::error::{Result, ValidationError};
use crate::pow::{check_difficulty, SearchLimit};

/// Append-only sequence of blocks, each linked to its predecessor's hash and
/// mined to a fixed difficulty before it is stored.
#[derive(Clone, Debug, Serialize)]
pub struct Chain {
    #[serde(rename = "chain")]
    blocks: Vec<Block>,
    difficulty: u32,
    #[serde(skip)]
    max_attempts: Option<u64>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Chain holding only the genesis block, at the default difficulty.
    pub fn new() -> Self {
        let config = ChainConfig::default();
        Self {
            blocks: vec![genesis_block()],
            difficulty: config.difficulty,
            max_attempts: config.max_attempts,
        }
    }

    pub fn with_difficulty(difficulty: u32) -> Result<Self> {
        Self::from_config(&ChainConfig {
            difficulty,
            ..ChainConfig::default()
        })
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        check_difficulty(config.difficulty)?;
        Ok(Self {
            blocks: vec![genesis_block()],
            difficulty: config.difficulty,
            max_attempts: config.max_attempts,
        })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Mutable access to a stored block. Changing a block here without
    /// remining breaks the chain; [`Chain::validate`] will report it.
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    /// Index of the latest block (0 when only genesis is present).
    pub fn height(&self) -> u64 {
        self.latest_block().index
    }

    pub fn latest_block(&self) -> &Block {
        // `blocks` always holds at least the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Link `block` to the current tip, mine it and append it.
    ///
    /// Uses the chain's configured attempt cap, unbounded by default.
    pub fn add_block(&mut self, block: Block) -> Result<&Block> {
        let limit = SearchLimit {
            max_attempts: self.max_attempts,
            cancel: None,
        };
        self.add_block_with(block, &limit)
    }

    /// Like [`Chain::add_block`] with an explicit search limit. On error the
    /// chain is unchanged and the candidate is dropped.
    pub fn add_block_with(&mut self, mut block: Block, limit: &SearchLimit) -> Result<&Block> {
        let tip = self.latest_block().hash.clone();
        debug!(index = block.index, previous = %tip, "linking block");
        block.relink(tip);
        block.mine_with(self.difficulty, limit)?;
        self.blocks.push(block);
        Ok(self.latest_block())
    }

    /// `true` when every non-genesis block hashes to its stored `hash` and
    /// links to its predecessor.
    pub fn is_chain_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// First failing block, scanning from index 1. Genesis is trusted.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        match self.findings().next() {
            Some(err) => {
                warn!(%err, "chain validation failed");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Every failing block, in chain order.
    pub fn audit(&self) -> Vec<ValidationError> {
        let findings: Vec<_> = self.findings().collect();
        if !findings.is_empty() {
            warn!(count = findings.len(), "chain audit found faults");
        }
        findings
    }

    fn findings(&self) -> impl Iterator<Item = ValidationError> + '_ {
        self.blocks.windows(2).zip(1u64..).flat_map(|(pair, position)| {
            let (previous, current) = (&pair[0], &pair[1]);
            let mut faults = Vec::new();
            let computed = current.compute_hash();
            if current.hash != computed {
                faults.push(ValidationError::ContentMismatch {
                    index: position,
                    stored: current.hash.clone(),
                    computed,
                });
            }
            if current.previous_hash != previous.hash {
                faults.push(ValidationError::LinkMismatch {
                    index: position,
                    expected: previous.hash.clone(),
                    found: current.previous_hash.clone(),
                });
            }
            faults
        })
    }

    /// Indented JSON dump of the whole chain.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The fixed first block. Never mined, never validated.
pub fn genesis_block() -> Block {
    Block::from_value(
        0,
        GENESIS_TIMESTAMP,
        GENESIS_DATA.into(),
        GENESIS_PREVIOUS_HASH,
        0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use serde_json::json;

    fn small_chain() -> Chain {
        let mut chain = Chain::with_difficulty(1).unwrap();
        for i in 1..=3u64 {
            let block = Block::new(i, format!("0{i}/02/2018"), &json!({ "amount": i })).unwrap();
            chain.add_block(block).unwrap();
        }
        chain
    }

    #[test]
    fn genesis_block_example() {
        let genesis = genesis_block();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.timestamp, "01/01/2018");
        assert_eq!(genesis.data, json!("Genesis block"));
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.is_hash_consistent());
    }

    #[test]
    fn new_chain_holds_only_genesis() {
        let chain = Chain::new();
        assert_eq!(chain.blocks().len(), 1);
        assert_eq!(chain.difficulty(), 4);
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.latest_block(), &genesis_block());
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn rejects_unreachable_difficulty() {
        assert!(matches!(
            Chain::with_difficulty(65),
            Err(LedgerError::DifficultyOutOfRange { difficulty: 65, .. })
        ));
    }

    #[test]
    fn add_block_overwrites_previous_hash() {
        let mut chain = Chain::with_difficulty(1).unwrap();
        let block = Block::with_link(1, "ts", &json!(1), "bogus", 0).unwrap();
        let stored = chain.add_block(block).unwrap();
        assert_eq!(stored.previous_hash, genesis_block().hash);
        assert!(stored.hash.starts_with('0'));
    }

    #[test]
    fn linkage_holds_for_every_block() {
        let chain = small_chain();
        for pair in chain.blocks().windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash);
        }
        assert!(chain.is_chain_valid());
        assert!(chain.audit().is_empty());
    }

    // Fixed behavior, not a literal port: a scan that returns after the
    // first non-genesis block lets tampering further down go unnoticed.
    #[test]
    fn tampering_beyond_first_block_is_detected() {
        let mut chain = small_chain();
        chain.block_mut(3).unwrap().data = json!({ "amount": 1000 });
        assert!(!chain.is_chain_valid());
        assert_eq!(chain.validate().unwrap_err().index(), 3);
    }

    #[test]
    fn content_and_link_faults_are_distinguished() {
        let mut chain = small_chain();
        let block = chain.block_mut(2).unwrap();
        block.data = json!({ "amount": 7 });
        block.hash = block.compute_hash();

        let findings = chain.audit();
        // Block 2 is self-consistent again; block 3 still points at the old hash.
        assert_eq!(findings.len(), 1);
        assert!(matches!(
            &findings[0],
            ValidationError::LinkMismatch { index: 3, .. }
        ));
    }

    #[test]
    fn audit_reports_every_failing_block() {
        let mut chain = small_chain();
        chain.block_mut(1).unwrap().timestamp = "forged".into();
        chain.block_mut(3).unwrap().nonce += 1;
        let indices: Vec<u64> = chain.audit().iter().map(ValidationError::index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn genesis_is_exempt_from_validation() {
        let mut chain = small_chain();
        chain.block_mut(0).unwrap().data = json!("rewritten");
        assert!(chain.is_chain_valid());
    }

    #[test]
    fn failed_mining_leaves_chain_unchanged() {
        let mut chain = Chain::from_config(&ChainConfig {
            difficulty: 64,
            max_attempts: Some(25),
        })
        .unwrap();
        let block = Block::new(1, "ts", &json!({ "amount": 4 })).unwrap();
        let err = chain.add_block(block).unwrap_err();
        assert!(matches!(err, LedgerError::MiningExhausted { attempts: 25, .. }));
        assert_eq!(chain.blocks().len(), 1);
    }

    #[test]
    fn dump_nests_blocks_under_chain_key() {
        let chain = small_chain();
        let dump: serde_json::Value = serde_json::from_str(&chain.to_pretty_json().unwrap()).unwrap();
        assert_eq!(dump["difficulty"], 1);
        assert_eq!(dump["chain"].as_array().unwrap().len(), 4);
        assert_eq!(dump["chain"][1]["previousHash"], json!(chain.blocks()[0].hash));
        assert!(dump.get("max_attempts").is_none());
    }
}

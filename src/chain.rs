// ⛓️ Memory Chain - in-memory stand-in for the blockchain-access collaborator
// Loaded from a JSON fixture: { "logs": [...], "blocks": [...], "whitelisted": [...] }

use crate::codec::{RawBlock, RawEventLog};
use crate::temporal::{BlockSource, EventSource};
use crate::whitelist::{AccountAddress, WhitelistSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChainFixture {
    #[serde(default)]
    logs: Vec<RawEventLog>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
    #[serde(default)]
    whitelisted: Vec<String>,
}

/// MemoryChain - serves event logs, blocks and whitelist statuses from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    logs: Vec<RawEventLog>,
    blocks: HashMap<u64, RawBlock>,
    whitelisted: HashSet<String>,
}

impl MemoryChain {
    pub fn new(logs: Vec<RawEventLog>, blocks: Vec<RawBlock>) -> Self {
        MemoryChain {
            logs,
            blocks: blocks.into_iter().map(|b| (b.number, b)).collect(),
            whitelisted: HashSet::new(),
        }
    }

    pub fn with_whitelisted(mut self, address: &AccountAddress) -> Self {
        self.whitelisted.insert(address.as_str().to_lowercase());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: ChainFixture = serde_json::from_str(json).context("Failed to parse chain fixture")?;
        let chain = MemoryChain::new(fixture.logs, fixture.blocks);
        Ok(MemoryChain {
            whitelisted: fixture.whitelisted.iter().map(|a| a.to_lowercase()).collect(),
            ..chain
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chain fixture {:?}", path))?;
        Self::from_json(&json)
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }
}

#[async_trait]
impl EventSource for MemoryChain {
    async fn past_events(&self, event_name: &str, from_block: u64) -> Result<Vec<RawEventLog>> {
        Ok(self
            .logs
            .iter()
            .filter(|log| log.event == event_name && log.block_number >= from_block)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BlockSource for MemoryChain {
    async fn block(&self, number: u64) -> Result<Option<RawBlock>> {
        Ok(self.blocks.get(&number).copied())
    }
}

#[async_trait]
impl WhitelistSource for MemoryChain {
    async fn is_whitelisted(&self, address: &AccountAddress) -> Result<bool> {
        Ok(self.whitelisted.contains(&address.as_str().to_lowercase()))
    }
}

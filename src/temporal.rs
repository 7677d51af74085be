// ⏰ Temporal - resolve block numbers to wall-clock time
// Block number orders events before enrichment; timestamps come from the chain
//
// Both async operations dispatch their whole batch at once and complete only
// when every sub-request completes. A single failure fails the batch.

use crate::codec::{format_event_log, RawBlock, RawEventLog};
use crate::error::LookupError;
use crate::permit::{PermitEvent, PERMIT_CONFIRMED_EVENT, PERMIT_CREATED_EVENT};
use async_trait::async_trait;
use futures_util::future::{try_join, try_join_all};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

// ============================================================================
// COLLABORATORS
// ============================================================================

/// EventSource - past event logs of the permit contract
#[async_trait]
pub trait EventSource: Send + Sync {
    /// All logs named `event_name` from `from_block` onwards
    async fn past_events(&self, event_name: &str, from_block: u64) -> anyhow::Result<Vec<RawEventLog>>;
}

/// BlockSource - block records by number
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// `Ok(None)` when the node does not know the block
    async fn block(&self, number: u64) -> anyhow::Result<Option<RawBlock>>;
}

// ============================================================================
// EVENT FETCH
// ============================================================================

/// Fetch and format every `event_name` log from `from_block`
pub async fn fetch_permit_events<S: EventSource + ?Sized>(
    source: &S,
    event_name: &str,
    from_block: u64,
) -> Result<Vec<PermitEvent>, LookupError> {
    let logs = source
        .past_events(event_name, from_block)
        .await
        .map_err(|e| LookupError::EventFetch {
            event_name: event_name.to_string(),
            from_block,
            reason: e.to_string(),
        })?;

    debug!(event_name, from_block, count = logs.len(), "fetched permit logs");

    logs.iter()
        .map(|log| {
            format_event_log(log).map_err(|source| LookupError::EventDecode {
                event_name: event_name.to_string(),
                source,
            })
        })
        .collect()
}

/// Fetch created and confirmed permit events together
///
/// Created events come first, followed by confirmed ones.
pub async fn fetch_all_permit_events<S: EventSource + ?Sized>(
    source: &S,
    from_block: u64,
) -> Result<Vec<PermitEvent>, LookupError> {
    let (mut created, confirmed) = try_join(
        fetch_permit_events(source, PERMIT_CREATED_EVENT, from_block),
        fetch_permit_events(source, PERMIT_CONFIRMED_EVENT, from_block),
    )
    .await?;

    created.extend(confirmed);
    Ok(created)
}

// ============================================================================
// TIMESTAMP ENRICHMENT
// ============================================================================

/// Attach `timestamp = block.timestamp * 1000` to every event
///
/// Each distinct block is looked up once, all lookups concurrently. Event order
/// and all other fields are preserved.
pub async fn enrich_timestamps<B: BlockSource + ?Sized>(
    events: &[PermitEvent],
    blocks: &B,
) -> Result<Vec<PermitEvent>, LookupError> {
    let numbers: BTreeSet<u64> = events.iter().map(|e| e.block_number).collect();
    debug!(events = events.len(), blocks = numbers.len(), "resolving block timestamps");

    let resolved = try_join_all(numbers.into_iter().map(|number| async move {
        match blocks.block(number).await {
            Ok(Some(block)) => Ok((number, block_time_ms(&block))),
            Ok(None) => Err(LookupError::BlockNotFound(number)),
            Err(e) => Err(LookupError::BlockLookup {
                block_number: number,
                reason: e.to_string(),
            }),
        }
    }))
    .await?;

    let times: HashMap<u64, i64> = resolved.into_iter().collect();

    events
        .iter()
        .map(|e| {
            times
                .get(&e.block_number)
                .map(|ms| e.with_timestamp(*ms))
                .ok_or(LookupError::BlockNotFound(e.block_number))
        })
        .collect()
}

/// Block time in milliseconds since epoch
pub fn block_time_ms(block: &RawBlock) -> i64 {
    i64::try_from(block.timestamp)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}

// ============================================================================
// TESTS
// ============================================================================

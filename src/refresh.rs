// 🔄 Refresh Cycle - fetch → merge → enrich
// One logical refresh of the reconciled permit event set

use crate::error::LookupError;
use crate::merge::merge_permit_events;
use crate::permit::PermitEvent;
use crate::temporal::{enrich_timestamps, fetch_all_permit_events, BlockSource, EventSource};
use tracing::info;

/// Fetch both event kinds, fold them into `existing`, resolve timestamps
///
/// Callers serialize refresh cycles. `existing` is not modified; the returned
/// set replaces it.
pub async fn refresh_permit_events<E, B>(
    existing: &[PermitEvent],
    events: &E,
    blocks: &B,
    from_block: u64,
) -> Result<Vec<PermitEvent>, LookupError>
where
    E: EventSource + ?Sized,
    B: BlockSource + ?Sized,
{
    let fetched = fetch_all_permit_events(events, from_block).await?;
    let merged = merge_permit_events(existing, &fetched);
    let enriched = enrich_timestamps(&merged, blocks).await?;

    info!(
        existing = existing.len(),
        fetched = fetched.len(),
        reconciled = enriched.len(),
        from_block,
        "permit events refreshed"
    );

    Ok(enriched)
}

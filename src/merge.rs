// 🔀 Event Merger - fold new permit events into the known set
// One event per permit hash; a processed event supersedes a created one

use crate::permit::PermitEvent;

/// Merge newly fetched events into the existing set
///
/// New events are considered before old ones. Walking that sequence:
/// - unseen permit hash → appended
/// - seen, current is processed → existing entry removed, current appended
/// - seen, current is created → existing entry kept
///
/// Inputs are borrowed and never modified; a fresh collection is returned.
pub fn merge_permit_events(old_events: &[PermitEvent], new_events: &[PermitEvent]) -> Vec<PermitEvent> {
    let mut merged: Vec<PermitEvent> = Vec::with_capacity(old_events.len() + new_events.len());

    for current in new_events.iter().chain(old_events) {
        match merged.iter().position(|e| e.permit_hash == current.permit_hash) {
            None => merged.push(current.clone()),
            Some(index) if current.kind.is_processed() => {
                merged.remove(index);
                merged.push(current.clone());
            }
            Some(_) => {}
        }
    }

    merged
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permit::EventKind;
    use std::collections::HashSet;

    fn created(hash: &str, block: u64) -> PermitEvent {
        PermitEvent::new(EventKind::Created, block, hash, "DE", "CH")
    }

    fn processed(hash: &str, block: u64) -> PermitEvent {
        PermitEvent::new(EventKind::Processed, block, hash, "DE", "CH")
    }

    fn by_hash(events: &[PermitEvent]) -> Vec<PermitEvent> {
        let mut sorted = events.to_vec();
        sorted.sort_by(|a, b| a.permit_hash.cmp(&b.permit_hash));
        sorted
    }

    #[test]
    fn test_refresh_scenario() {
        let old = vec![created("0xA", 5)];
        let new = vec![processed("0xA", 9), created("0xB", 10)];

        let merged = merge_permit_events(&old, &new);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged, vec![processed("0xA", 9), created("0xB", 10)]);
    }

    #[test]
    fn test_processed_wins_from_either_side() {
        // processed in the old list, created in the new list
        let merged = merge_permit_events(&[processed("0xA", 9)], &[created("0xA", 5)]);
        assert_eq!(merged, vec![processed("0xA", 9)]);

        // processed in the new list, created in the old list
        let merged = merge_permit_events(&[created("0xA", 5)], &[processed("0xA", 9)]);
        assert_eq!(merged, vec![processed("0xA", 9)]);
    }

    #[test]
    fn test_first_seen_created_wins() {
        // New list is considered first, so its created event takes the slot
        let merged = merge_permit_events(&[created("0xA", 1)], &[created("0xA", 7)]);
        assert_eq!(merged, vec![created("0xA", 7)]);
    }

    #[test]
    fn test_replaced_entry_moves_to_end() {
        let old = vec![processed("0x1", 20)];
        let new = vec![created("0x1", 10), created("0x2", 11)];

        let merged = merge_permit_events(&old, &new);
        assert_eq!(merged, vec![created("0x2", 11), processed("0x1", 20)]);
    }

    #[test]
    fn test_empty_inputs() {
        let events = vec![created("0x1", 1), processed("0x2", 2)];

        assert!(merge_permit_events(&[], &[]).is_empty());
        assert_eq!(merge_permit_events(&events, &[]), events);
        assert_eq!(merge_permit_events(&[], &events), events);
    }

    #[test]
    fn test_merge_idempotent() {
        let a = vec![created("0x1", 1), created("0x2", 2), processed("0x3", 3)];
        let b = vec![processed("0x1", 4), created("0x4", 5), created("0x3", 1)];

        let once = merge_permit_events(&a, &b);
        assert_eq!(merge_permit_events(&once, &[]), once);

        // Self-merge keeps one entry per hash with identical content
        let again = merge_permit_events(&once, &once);
        assert_eq!(by_hash(&again), by_hash(&once));
    }

    #[test]
    fn test_merge_cardinality() {
        let a = vec![created("0x1", 1), created("0x2", 2), processed("0x2", 3), created("0x5", 3)];
        let b = vec![processed("0x1", 4), created("0x4", 5), created("0x2", 6)];

        let merged = merge_permit_events(&a, &b);

        let distinct: HashSet<&str> = a.iter().chain(&b).map(|e| e.permit_hash.as_str()).collect();
        assert_eq!(merged.len(), distinct.len());

        let unique: HashSet<&str> = merged.iter().map(|e| e.permit_hash.as_str()).collect();
        assert_eq!(unique.len(), merged.len());

        // Every hash that has a processed event anywhere ends up processed
        for hash in ["0x1", "0x2"] {
            let event = merged.iter().find(|e| e.permit_hash == hash).unwrap();
            assert_eq!(event.kind, EventKind::Processed);
        }
    }

    #[test]
    fn test_inputs_untouched() {
        let old = vec![created("0xA", 5)];
        let new = vec![processed("0xA", 9)];
        let _ = merge_permit_events(&old, &new);

        assert_eq!(old, vec![created("0xA", 5)]);
        assert_eq!(new, vec![processed("0xA", 9)]);
    }
}

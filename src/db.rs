use crate::permit::{EventKind, PermitEvent};
use crate::sort::PERMITS_TABLE_COLUMNS;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, info};

/// Event for audit trail (every status change of a permit is recorded)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl AuditEvent {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// What changed between the stored snapshot and the one just saved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub total: usize,
    pub added: usize,
    pub status_changed: usize,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Reconciled snapshot (one row per permit hash, replaced on every save)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS permit_events (
            permit_hash TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            status TEXT NOT NULL,
            block_number INTEGER NOT NULL,
            export_country TEXT NOT NULL,
            import_country TEXT NOT NULL,
            timestamp_ms INTEGER
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SNAPSHOT
// ============================================================================

fn kind_from_sql(status: &str) -> rusqlite::Result<EventKind> {
    match status {
        "created" => Ok(EventKind::Created),
        "processed" => Ok(EventKind::Processed),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown permit status '{}'", other).into(),
        )),
    }
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PermitEvent> {
    let status: String = row.get(1)?;
    let block_number: i64 = row.get(2)?;

    Ok(PermitEvent {
        permit_hash: row.get(0)?,
        kind: kind_from_sql(&status)?,
        block_number: block_number as u64,
        export_country: row.get(3)?,
        import_country: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

/// Replace the stored snapshot with `events` in one transaction
///
/// Permits that are new, or whose status changed, get an audit event.
pub fn save_snapshot(conn: &mut Connection, events: &[PermitEvent]) -> Result<SnapshotDiff> {
    let previous: HashMap<String, EventKind> = load_snapshot(conn)?
        .into_iter()
        .map(|e| (e.permit_hash, e.kind))
        .collect();

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM permit_events", [])?;

    let mut diff = SnapshotDiff {
        total: events.len(),
        ..SnapshotDiff::default()
    };

    for (position, event) in events.iter().enumerate() {
        tx.execute(
            "INSERT INTO permit_events (
                permit_hash, position, status, block_number,
                export_country, import_country, timestamp_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.permit_hash,
                position as i64,
                event.kind.as_str(),
                event.block_number as i64,
                event.export_country,
                event.import_country,
                event.timestamp,
            ],
        )
        .with_context(|| format!("Failed to store permit event {}", event.permit_hash))?;

        let change = match previous.get(&event.permit_hash) {
            None => Some("permit_added"),
            Some(kind) if *kind != event.kind => Some("permit_status_changed"),
            Some(_) => None,
        };

        if let Some(event_type) = change {
            if event_type == "permit_added" {
                diff.added += 1;
            } else {
                diff.status_changed += 1;
            }
            let audit = AuditEvent::new(
                event_type,
                "permit",
                &event.permit_hash,
                serde_json::json!({
                    "status": event.kind.as_str(),
                    "block_number": event.block_number,
                    "export_country": event.export_country,
                    "import_country": event.import_country,
                }),
                "reconciler",
            );
            insert_event(&tx, &audit)?;
        }
    }

    tx.commit()?;

    info!(
        total = diff.total,
        added = diff.added,
        status_changed = diff.status_changed,
        "snapshot saved"
    );

    Ok(diff)
}

/// Stored snapshot in the order it was saved
pub fn load_snapshot(conn: &Connection) -> Result<Vec<PermitEvent>> {
    let mut stmt = conn.prepare(
        "SELECT permit_hash, status, block_number, export_country, import_country, timestamp_ms
         FROM permit_events
         ORDER BY position",
    )?;

    let events = stmt
        .query_map([], event_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read permit snapshot")?;

    debug!(count = events.len(), "snapshot loaded");
    Ok(events)
}

pub fn get_permit_event(conn: &Connection, permit_hash: &str) -> Result<Option<PermitEvent>> {
    let event = conn
        .query_row(
            "SELECT permit_hash, status, block_number, export_country, import_country, timestamp_ms
             FROM permit_events
             WHERE permit_hash = ?1",
            params![permit_hash],
            event_from_row,
        )
        .optional()?;

    Ok(event)
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &AuditEvent) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(AuditEvent {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
                    })?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// CSV EXPORT
// ============================================================================

/// RFC 3339 rendering of a millisecond timestamp
pub fn format_timestamp(timestamp_ms: Option<i64>) -> String {
    timestamp_ms
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

/// Write events as CSV with the permits table columns as header
pub fn export_events_csv<W: Write>(writer: W, events: &[PermitEvent]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(PERMITS_TABLE_COLUMNS.iter().map(|c| c.label()))?;
    for event in events {
        wtr.write_record([
            event.permit_hash.as_str(),
            event.export_country.as_str(),
            event.import_country.as_str(),
            format_timestamp(event.timestamp).as_str(),
            event.kind.as_str(),
        ])?;
    }

    wtr.flush().context("Failed to flush CSV export")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(hash: &str, kind: EventKind, block: u64, timestamp: Option<i64>) -> PermitEvent {
        PermitEvent {
            kind,
            block_number: block,
            permit_hash: hash.to_string(),
            export_country: "DE".to_string(),
            import_country: "CH".to_string(),
            timestamp,
        }
    }

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_snapshot_round_trip_keeps_order() {
        let mut conn = open();
        let events = vec![
            create_test_event("0xB", EventKind::Created, 10, Some(1_000_000)),
            create_test_event("0xA", EventKind::Processed, 9, None),
        ];

        let diff = save_snapshot(&mut conn, &events).unwrap();
        assert_eq!(diff, SnapshotDiff { total: 2, added: 2, status_changed: 0 });

        assert_eq!(load_snapshot(&conn).unwrap(), events);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let mut conn = open();
        save_snapshot(&mut conn, &[
            create_test_event("0xA", EventKind::Created, 5, None),
            create_test_event("0xC", EventKind::Created, 6, None),
        ])
        .unwrap();

        let next = vec![create_test_event("0xA", EventKind::Processed, 9, Some(9_000))];
        let diff = save_snapshot(&mut conn, &next).unwrap();

        assert_eq!(diff, SnapshotDiff { total: 1, added: 0, status_changed: 1 });
        assert_eq!(load_snapshot(&conn).unwrap(), next);
        assert_eq!(get_permit_event(&conn, "0xC").unwrap(), None);
        assert_eq!(get_permit_event(&conn, "0xA").unwrap(), Some(next[0].clone()));
    }

    #[test]
    fn test_status_changes_are_audited() {
        let mut conn = open();
        save_snapshot(&mut conn, &[create_test_event("0xA", EventKind::Created, 5, None)]).unwrap();
        save_snapshot(&mut conn, &[create_test_event("0xA", EventKind::Created, 5, Some(5_000))]).unwrap();
        save_snapshot(&mut conn, &[create_test_event("0xA", EventKind::Processed, 9, None)]).unwrap();

        let trail = get_events_for_entity(&conn, "permit", "0xA").unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].event_type, "permit_status_changed");
        assert_eq!(trail[0].data["status"], "processed");
        assert_eq!(trail[1].event_type, "permit_added");
        assert_eq!(trail[1].actor, "reconciler");
    }

    #[test]
    fn test_event_log() {
        let conn = open();

        let event = AuditEvent::new(
            "test_event",
            "permit",
            "0x123",
            serde_json::json!({"test": "data"}),
            "test_actor",
        );

        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "permit", "0x123").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "test_event");
        assert_eq!(events[0].actor, "test_actor");
    }

    #[test]
    fn test_export_csv() {
        let events = vec![
            create_test_event("0xA", EventKind::Processed, 9, Some(1_000_000)),
            create_test_event("0xB", EventKind::Created, 10, None),
        ];

        let mut out = Vec::new();
        export_events_csv(&mut out, &events).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "permitHash,exportCountry,importCountry,timestamp,status");
        assert_eq!(lines[1], "0xA,DE,CH,1970-01-01T00:16:40+00:00,processed");
        assert_eq!(lines[2], "0xB,DE,CH,,created");
    }
}

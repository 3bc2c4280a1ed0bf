//! Standalone query functions for the `events` table.
//!
//! Each function takes a `&Connection` and performs exactly one statement, so
//! every call is atomic on its own.

use crate::PendingEvent;
use rusqlite::{params, Connection};
use tracing::debug;

/// Insert an event, replacing the payload if the id is already stored.
///
/// An overwrite keeps the row's original `rowid`, so batch order is unchanged.
pub fn upsert_event(conn: &Connection, event_id: &str, payload: &str) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO events (event_id, event_data) VALUES (?1, ?2)
         ON CONFLICT(event_id) DO UPDATE SET event_data = excluded.event_data",
    )?
    .execute(params![event_id, payload])?;
    debug!(event_id = %event_id, "Pending event stored");
    Ok(())
}

/// Read up to `limit` pending events in insertion order.
pub fn list_events(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<PendingEvent>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare_cached(
        "SELECT event_id, event_data FROM events ORDER BY rowid ASC LIMIT ?1",
    )?;

    let events = stmt
        .query_map(params![limit], |row| {
            Ok(PendingEvent {
                event_id: row.get(0)?,
                payload: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Delete an event by id. Returns whether a row was removed.
pub fn delete_event(conn: &Connection, event_id: &str) -> rusqlite::Result<bool> {
    let removed = conn
        .prepare_cached("DELETE FROM events WHERE event_id = ?1")?
        .execute(params![event_id])?;
    Ok(removed > 0)
}

/// Count pending events.
pub fn count_events(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

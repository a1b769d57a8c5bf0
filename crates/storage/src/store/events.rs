#![forbid(unsafe_code)]

use super::{EventRow, EventsListRequest, SqliteStore, StoreError};
use rusqlite::params;

impl SqliteStore {
    pub fn events_list(&self, request: EventsListRequest) -> Result<Vec<EventRow>, StoreError> {
        let EventsListRequest {
            board_id,
            since_seq,
            limit,
        } = request;
        let limit = super::to_sqlite_i64(limit)?;

        let mut out = Vec::new();
        match board_id {
            Some(board_id) => {
                let mut stmt = self.conn.prepare(
                    r#"
                    SELECT seq, ts_ms, board_id, entity, entity_id, type, payload_json
                    FROM events
                    WHERE board_id = ?1 AND seq > ?2
                    ORDER BY seq ASC
                    LIMIT ?3
                    "#,
                )?;
                let mut rows = stmt.query(params![board_id.get(), since_seq, limit])?;
                while let Some(row) = rows.next()? {
                    out.push(read_event(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    r#"
                    SELECT seq, ts_ms, board_id, entity, entity_id, type, payload_json
                    FROM events
                    WHERE seq > ?1
                    ORDER BY seq ASC
                    LIMIT ?2
                    "#,
                )?;
                let mut rows = stmt.query(params![since_seq, limit])?;
                while let Some(row) = rows.next()? {
                    out.push(read_event(row)?);
                }
            }
        }
        Ok(out)
    }
}

fn read_event(row: &rusqlite::Row<'_>) -> Result<EventRow, StoreError> {
    Ok(EventRow {
        seq: row.get(0)?,
        ts_ms: row.get(1)?,
        board_id: row.get(2)?,
        entity: row.get(3)?,
        entity_id: row.get(4)?,
        event_type: row.get(5)?,
        payload_json: row.get(6)?,
    })
}

//! User message log
//!
//! Append-only log of user interactions, one row per message. The `notes`
//! column doubles as a semi-structured field: successful search hits are
//! written as `"Found: <name> | NOTE: <detail>"`, and history extraction
//! parses that shape back out. The marker tokens are a de facto wire format
//! shared with the producers of this column; do not change them.

use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;

use crate::connection::StoreConn;
use crate::value::SqlValue;

/// Prefix marking a successful search hit in the notes column.
const FOUND_PREFIX: &str = "Found: ";

/// Separator between the perfume name and the free-text detail.
const NOTE_MARKER: &str = " | NOTE:";

/// Repository for the user message log.
pub struct MessageRepository<'a> {
    conn: &'a mut StoreConn,
}

impl<'a> MessageRepository<'a> {
    pub fn new(conn: &'a mut StoreConn) -> Self {
        Self { conn }
    }

    /// Append one interaction row stamped with the current wall-clock time.
    ///
    /// The row autocommits; there is no return value. `notes` is
    /// conventionally empty when the interaction carries no detail.
    pub fn log_message(
        &mut self,
        user_id: i64,
        message: &str,
        status: &str,
        notes: &str,
    ) -> Result<()> {
        let now = Utc::now();
        let epoch = now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0;

        self.conn.execute(
            "INSERT INTO UserMessages (user_id, timestamp, message, status, notes) \
             VALUES (%s, to_timestamp(%s), %s, %s, %s)",
            &[
                SqlValue::Integer(user_id),
                SqlValue::Float(epoch),
                SqlValue::Text(message.to_string()),
                SqlValue::Text(status.to_string()),
                SqlValue::Text(notes.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Recently found perfume names for a user, newest first.
    ///
    /// Scans at most the 20 most recent successful rows whose notes carry the
    /// `"Found: "` marker, and collects up to `limit` names (conventionally
    /// 5). Rows are deduplicated by the raw notes string, not by the
    /// extracted name, so the same name reappears when the surrounding notes
    /// differ. Rows whose notes lack the prefix marker are skipped silently;
    /// a missing `" | NOTE:"` separator keeps the whole remainder as the
    /// name.
    pub fn fetch_user_history(&mut self, user_id: i64, limit: usize) -> Result<Vec<String>> {
        let rows = self.conn.query(
            "SELECT notes, timestamp \
             FROM UserMessages \
             WHERE user_id = %s AND status = 'success' AND notes LIKE 'Found: %' \
             ORDER BY timestamp DESC \
             LIMIT 20",
            &[SqlValue::Integer(user_id)],
        )?;

        let mut seen_notes: HashSet<String> = HashSet::new();
        let mut history = Vec::new();

        for row in &rows {
            if history.len() >= limit {
                break;
            }
            let Some(notes) = row.text("notes") else {
                continue;
            };
            if seen_notes.contains(&notes) {
                continue;
            }
            let Some(tail) = notes.split(FOUND_PREFIX).nth(1) else {
                continue;
            };
            let name = tail.split(NOTE_MARKER).next().unwrap_or(tail).to_string();
            seen_notes.insert(notes);
            history.push(name);
        }

        Ok(history)
    }
}

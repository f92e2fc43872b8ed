//! Schema definitions and initialization
//!
//! Three tables make up the store. Creation is idempotent
//! (`CREATE TABLE IF NOT EXISTS`) and safe to run on every process start.
//! The autoincrement primary-key syntax differs per backend and is
//! substituted at call time from the connection's [`Backend`].

use anyhow::Result;
use tracing::debug;

use crate::backend::Backend;
use crate::connection::StoreConn;

/// DDL for the store's tables, authored in the canonical dialect.
///
/// Column names and types are a compatibility surface; other components read
/// this store directly.
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// User interaction log. `{id_type}` is replaced with the backend's
    /// autoincrement primary-key syntax.
    pub const USER_MESSAGES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS UserMessages (
            id {id_type},
            user_id BIGINT NOT NULL,
            timestamp TIMESTAMP,
            message TEXT NOT NULL,
            status TEXT NOT NULL,
            notes TEXT
        );
    "#;

    /// Reference catalog of original perfumes. Rows are created externally;
    /// this crate only reads them.
    pub const ORIGINAL_PERFUME_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS OriginalPerfume (
            id TEXT PRIMARY KEY,
            brand TEXT,
            name TEXT,
            price_eur REAL,
            url TEXT
        );
    "#;

    /// Clone counterparts. The foreign key is declared but not enforced on
    /// the embedded backend.
    pub const COPY_PERFUME_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS CopyPerfume (
            id TEXT PRIMARY KEY,
            original_id TEXT,
            brand TEXT,
            name TEXT,
            price_eur REAL,
            url TEXT,
            notes TEXT,
            saved_amount REAL,
            FOREIGN KEY(original_id) REFERENCES OriginalPerfume(id)
        );
    "#;

    /// The user-messages DDL with the primary key resolved for `backend`.
    pub fn user_messages_table(backend: Backend) -> String {
        Self::USER_MESSAGES_TABLE.replace("{id_type}", backend.autoincrement_primary_key())
    }
}

/// Create the three store tables if they are absent.
///
/// Each statement autocommits. Calling this repeatedly is a no-op once the
/// tables exist.
pub fn init_if_not_exists(conn: &mut StoreConn) -> Result<()> {
    let backend = conn.backend();

    conn.execute(&SchemaDefinitions::user_messages_table(backend), &[])?;
    conn.execute(SchemaDefinitions::ORIGINAL_PERFUME_TABLE, &[])?;
    conn.execute(SchemaDefinitions::COPY_PERFUME_TABLE, &[])?;

    debug!("Store schema initialized ({} backend)", backend);
    Ok(())
}

//! Connection resolution and unified statement execution
//!
//! [`StoreConn`] wraps one open driver handle, embedded or client/server,
//! picked once from the configured URL. Statements are authored in the
//! canonical dialect (see [`Backend`](crate::Backend)) and adapted here
//! immediately before execution; rows come back as name-addressable
//! [`Row`]s on both backends.
//!
//! One handle is expected to be acquired per process (or per thread) and
//! reused across calls. The handle is never closed by this crate, performs
//! no internal locking, and blocks on every call; callers serialize
//! concurrent access themselves.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use rusqlite::params_from_iter;
use tracing::debug;

use crate::backend::Backend;
use crate::config::StoreConfig;
use crate::value::{Row, SqlValue};

#[cfg(not(feature = "postgres"))]
use crate::error::StoreError;

/// An open connection to the perfume store.
pub enum StoreConn {
    /// Embedded single-file backend.
    Sqlite(rusqlite::Connection),
    /// Client/server backend.
    #[cfg(feature = "postgres")]
    Postgres(postgres::Client),
}

impl StoreConn {
    /// Open a connection for the configured URL.
    ///
    /// `sqlite:///<path>` (or a bare path) opens the embedded backend,
    /// creating the parent directory first. A URL containing `postgres`
    /// opens the client/server backend; if the crate was built without the
    /// `postgres` feature this fails with
    /// [`StoreError::DriverUnavailable`](crate::StoreError::DriverUnavailable)
    /// rather than falling back.
    pub fn connect(config: &StoreConfig) -> Result<StoreConn> {
        match Backend::from_url(&config.database_url) {
            Backend::Postgres => Self::connect_postgres(&config.database_url),
            Backend::Sqlite => Self::open_sqlite(&config.database_url),
        }
    }

    /// Open an in-memory embedded store.
    ///
    /// Useful for tests and ephemeral sessions; the data vanishes when the
    /// handle drops.
    pub fn open_in_memory() -> Result<StoreConn> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?;
        Ok(StoreConn::Sqlite(conn))
    }

    fn open_sqlite(url: &str) -> Result<StoreConn> {
        let path = url.strip_prefix("sqlite:///").unwrap_or(url);

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    anyhow!("Failed to create data directory '{}': {}", parent.display(), e)
                })?;
            }
        }

        debug!("Opening embedded store at '{}'", path);
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| anyhow!("Failed to open database at '{}': {}", path, e))?;
        Ok(StoreConn::Sqlite(conn))
    }

    #[cfg(feature = "postgres")]
    fn connect_postgres(url: &str) -> Result<StoreConn> {
        debug!("Opening client/server store connection");
        let client = postgres::Client::connect(url, postgres::NoTls)
            .map_err(|e| anyhow!("Failed to connect to postgres: {}", e))?;
        Ok(StoreConn::Postgres(client))
    }

    #[cfg(not(feature = "postgres"))]
    fn connect_postgres(url: &str) -> Result<StoreConn> {
        Err(StoreError::DriverUnavailable(url.to_string()).into())
    }

    /// The backend this connection was opened against.
    pub fn backend(&self) -> Backend {
        match self {
            StoreConn::Sqlite(_) => Backend::Sqlite,
            #[cfg(feature = "postgres")]
            StoreConn::Postgres(_) => Backend::Postgres,
        }
    }

    /// Execute a canonical-dialect statement, returning the affected row
    /// count. The statement autocommits; no transaction spans multiple calls.
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        let adapted = self.backend().adapt(sql);
        match self {
            StoreConn::Sqlite(conn) => conn
                .execute(&adapted, params_from_iter(params.iter()))
                .map_err(|e| anyhow!("Failed to execute statement: {}", e)),
            #[cfg(feature = "postgres")]
            StoreConn::Postgres(client) => {
                let bound: Vec<&(dyn postgres::types::ToSql + Sync)> =
                    params.iter().map(SqlValue::as_pg_param).collect();
                let n = client
                    .execute(adapted.as_str(), &bound)
                    .map_err(|e| anyhow!("Failed to execute statement: {}", e))?;
                Ok(n as usize)
            }
        }
    }

    /// Run a canonical-dialect query, returning all rows.
    pub fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let adapted = self.backend().adapt(sql);
        match self {
            StoreConn::Sqlite(conn) => {
                let mut stmt = conn
                    .prepare(&adapted)
                    .map_err(|e| anyhow!("Failed to prepare query: {}", e))?;
                let names: Vec<String> =
                    stmt.column_names().iter().map(|s| s.to_string()).collect();

                let mut rows = stmt
                    .query(params_from_iter(params.iter()))
                    .map_err(|e| anyhow!("Failed to run query: {}", e))?;

                let mut out = Vec::new();
                while let Some(row) = rows.next().map_err(|e| anyhow!("Failed to read row: {}", e))? {
                    let mut values = Vec::with_capacity(names.len());
                    for i in 0..names.len() {
                        let cell = row
                            .get_ref(i)
                            .map_err(|e| anyhow!("Failed to read column {}: {}", i, e))?;
                        values.push(SqlValue::from(cell));
                    }
                    out.push(Row::new(names.clone(), values));
                }
                Ok(out)
            }
            #[cfg(feature = "postgres")]
            StoreConn::Postgres(client) => {
                let bound: Vec<&(dyn postgres::types::ToSql + Sync)> =
                    params.iter().map(SqlValue::as_pg_param).collect();
                let rows = client
                    .query(adapted.as_str(), &bound)
                    .map_err(|e| anyhow!("Failed to run query: {}", e))?;
                decode_pg_rows(&rows)
            }
        }
    }

    /// Run a canonical-dialect query expected to yield at most one row.
    pub fn query_opt(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}

#[cfg(feature = "postgres")]
fn decode_pg_rows(rows: &[postgres::Row]) -> Result<Vec<Row>> {
    let mut out = Vec::with_capacity(rows.len());
    for pg_row in rows {
        let columns = pg_row.columns();
        let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
        let mut values = Vec::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            values.push(decode_pg_value(pg_row, i, col)?);
        }
        out.push(Row::new(names, values));
    }
    Ok(out)
}

/// Decode one postgres cell into the shared value type.
///
/// TIMESTAMP columns come back as epoch seconds, matching what the embedded
/// backend hands back for its raw-epoch storage.
#[cfg(feature = "postgres")]
fn decode_pg_value(row: &postgres::Row, idx: usize, col: &postgres::Column) -> Result<SqlValue> {
    use postgres::types::Type;

    let ty = col.type_();
    let value = if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR {
        row.try_get::<_, Option<String>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Text)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Integer)
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?
            .map_or(SqlValue::Null, |v| SqlValue::Integer(i64::from(v)))
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?
            .map_or(SqlValue::Null, |v| SqlValue::Integer(i64::from(v)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Float)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?
            .map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v)))
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map_or(SqlValue::Null, |ts| {
                SqlValue::Float(ts.and_utc().timestamp_micros() as f64 / 1_000_000.0)
            })
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map_or(SqlValue::Null, |ts| {
                SqlValue::Float(ts.timestamp_micros() as f64 / 1_000_000.0)
            })
    } else if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?
            .map_or(SqlValue::Null, |v| SqlValue::Integer(i64::from(v)))
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Blob)
    } else {
        return Err(anyhow!(
            "Unsupported column type '{}' for column '{}'",
            ty,
            col.name()
        ));
    };
    Ok(value)
}

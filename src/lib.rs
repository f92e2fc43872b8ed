#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Decant - storage layer for a perfume catalog
//!
//! Decant stores a catalog of original fragrances, the clone entries that
//! reference them, and an append-only log of user interactions. Two backends
//! sit behind one procedural API: an embedded single-file store (SQLite) and
//! a client/server store (PostgreSQL, behind the `postgres` feature).
//!
//! Queries are authored once in a canonical dialect (`%s` placeholders,
//! `to_timestamp(%s)` for epoch parameters) and rewritten for the selected
//! backend immediately before execution, so no query exists in two copies.
//!
//! # Architecture
//!
//! - **[`config`]**: the connection URL, read once from `DATABASE_URL`
//! - **[`backend`]**: backend selection and dialect adaptation
//! - **[`connection`]**: connection resolution, unified execute/query
//! - **[`schema`]**: idempotent table creation
//! - **[`catalog`]**: read operations over originals and clones
//! - **[`messages`]**: the interaction log and history extraction
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use decant::{CatalogRepository, MessageRepository, StoreConfig, StoreConn};
//!
//! // Resolve the backend once from the environment and open it.
//! let config = StoreConfig::from_env()?;
//! let mut conn = StoreConn::connect(&config)?;
//! decant::init_if_not_exists(&mut conn)?;
//!
//! // Catalog reads.
//! let originals = CatalogRepository::new(&mut conn).fetch_all_originals()?;
//!
//! // Interaction log.
//! let mut log = MessageRepository::new(&mut conn);
//! log.log_message(42, "looking for chanel", "success", "Found: Chanel No5 | NOTE: dupe hit")?;
//! let recent = log.fetch_user_history(42, 5)?;
//! ```
//!
//! # Concurrency
//!
//! Every call blocks until the driver returns. The crate performs no
//! internal locking; one connection handle is expected per process (or per
//! thread) with callers serializing access to it. The handle is never closed
//! here.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod messages;
pub mod schema;
pub mod value;

pub use backend::Backend;
pub use catalog::{CatalogRepository, CloneRecord, CloneSummary, OriginalRecord, OriginalSummary};
pub use config::{StoreConfig, DEFAULT_DATABASE_URL};
pub use connection::StoreConn;
pub use error::StoreError;
pub use messages::MessageRepository;
pub use schema::{init_if_not_exists, SchemaDefinitions};
pub use value::{Row, SqlValue};

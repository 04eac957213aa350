//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! drafts::journal ─┐
//! publish         ─┼─▶ Store::begin_write ─▶ WriteTransaction ─▶ commit
//! agents          ─┘                              │ (drop = rollback)
//! http readers    ───▶ Store::begin_read ──▶ ReadTransaction (snapshot)
//! ```
//!
//! # Design Decisions
//! - redb with JSON rows under composite string keys (see `tables.rs`)
//! - Row helpers take the transaction as an argument so one publish can
//!   compose many of them atomically
//! - redb serialises write transactions; `ProjectLocks` adds the no-wait
//!   per-project lock publish needs to report contention instead of queueing

pub mod agents;
pub mod codec;
pub mod db;
pub mod entities;
pub mod error;
pub mod locks;
pub mod projects;
pub mod tables;
pub mod tokens;

pub use codec::TableRead;
pub use db::Store;
pub use entities::{Listing, StoredEntity};
pub use error::{StoreError, StoreResult};
pub use locks::{ProjectLockGuard, ProjectLocks};
pub use tokens::hash_token;

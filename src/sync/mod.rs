//! Agent-side synchronisation.
//!
//! # Data Flow
//! ```text
//! every interval:
//!     client.rs  GET .../version
//!         unchanged → PATCH .../agents/{name}/hit
//!         changed   → GET .../redirects, .../pages (all pages)
//!                   → Snapshot::compile (RedirectTree + PageTree)
//!                   → ArcSwap::store
//!                   → POST .../agents (status, version, loadDuration)
//! ```
//!
//! # Design Decisions
//! - Readers load the current snapshot without locking; a refresh builds a
//!   new one and swaps the pointer
//! - A failed refresh keeps serving the previous snapshot

pub mod client;
pub mod syncer;

pub use client::{ClientError, ManagerClient};
pub use syncer::{Snapshot, SyncError, SyncOutcome, Syncer};

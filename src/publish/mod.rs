//! Publish coordinator subsystem.
//!
//! # Data Flow
//! ```text
//! publish(ns, proj)
//!     → ProjectLocks::try_lock          (contention → PublishInProgress)
//!     → begin_write
//!     → load project, count drafts      (none → NothingToPublish)
//!     → quota.rs projected size         (over → QuotaExceeded)
//!     → redirects: CREATE, UPDATE, DELETE
//!     → pages:     CREATE, UPDATE, DELETE
//!     → final uniqueness check
//!     → version += 1, published_at = now
//!     → commit
//! ```
//!
//! # Design Decisions
//! - The project lock is the only serialisation point between publishers;
//!   losers fail fast and may retry
//! - Every step shares one redb write transaction; an error drops it and
//!   nothing becomes visible

pub mod coordinator;
pub mod quota;

pub use coordinator::Publisher;
pub use quota::{projected_total_size, PageLimits};

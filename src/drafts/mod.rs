//! Draft journal subsystem.
//!
//! # Data Flow
//! ```text
//! DraftInput<E>
//!     → validation.rs (shape, regex compiles, page size)
//!     → journal.rs (old-entity checks, source uniqueness, id allocation)
//!     → `{redirect,page}_drafts` tables
//!     → publish coordinator
//! ```
//!
//! # Design Decisions
//! - Generic over the entity kind; redirects and pages differ only in
//!   their unique key, their validation and their tables
//! - Each operation runs in one write transaction, so the uniqueness
//!   check and the insert cannot interleave with a concurrent writer

pub mod journal;
pub mod validation;

pub use journal::{is_source_available, DraftJournal};
pub use validation::DraftValue;

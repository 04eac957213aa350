//! Redirect and page matching.
//!
//! # Data Flow
//! ```text
//! published Redirect/Page rows
//!     → pattern.rs (literal prefix + compiled regex)
//!     → redirect_tree.rs / page_tree.rs (bucketed, immutable)
//!     → find(host, uri) → substitute.rs ($1..$9) → target
//! ```
//!
//! # Design Decisions
//! - Used on both sides: the manager compiles sources to validate drafts,
//!   agents compile whole trees to serve traffic
//! - Matching never allocates a regex at request time
//! - Hosts are compared exactly; normalising them is the caller's job

pub mod page_tree;
pub mod pattern;
pub mod redirect_tree;
pub mod substitute;

pub use page_tree::PageTree;
pub use pattern::{compile, extract_literal_prefix, CompiledPattern, PatternError};
pub use redirect_tree::{RedirectMatch, RedirectTree};
pub use substitute::substitute_groups;

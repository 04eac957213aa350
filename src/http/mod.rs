//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → SetRequestId / Trace / Timeout / body limit (server.rs)
//!     → track_metrics (server.rs)
//!     → require_token (auth.rs)           401 on missing or unknown bearer
//!     → handler
//!         agent_api.rs   version, published redirects/pages, agent upsert/hit
//!         management.rs  drafts, publish, agent overview
//!     → Error::into_response (error.rs)   {"error": "..."}
//! ```
//!
//! # Design Decisions
//! - Handlers call the store synchronously; redb transactions are short
//! - Draft handlers are generic over the entity, instantiated per route

pub mod agent_api;
pub mod auth;
pub mod error;
pub mod management;
pub mod pagination;
pub mod server;

pub use error::ErrorBody;
pub use pagination::{PageQuery, Paginated, DEFAULT_LIMIT};
pub use server::{build_router, AppState, HttpServer};

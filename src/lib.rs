//! Flecto Manager Library

pub mod agents;
pub mod config;
pub mod drafts;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod matching;
pub mod model;
pub mod observability;
pub mod publish;
pub mod store;
pub mod sync;

pub use config::schema::ManagerConfig;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::Store;

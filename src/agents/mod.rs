//! Agent registry and gauge sampling.
//!
//! # Data Flow
//! ```text
//! POST .../agents        → registry.rs upsert        → agents table
//! PATCH .../agents/x/hit → registry.rs update_last_hit
//!
//! every sample_interval:
//!     sampler.rs → all agents → group by (ns, proj) where lastHitAt > now - threshold
//!                → flecto_agents_online / flecto_agents_errors gauges
//!                → ArcSwap<AgentSample>
//! ```
//!
//! # Design Decisions
//! - Online state is derived from `lastHitAt` at read time, never stored
//! - A tick builds a fresh sample and swaps it in; nothing carries over
//!   from the previous tick

pub mod registry;
pub mod sampler;

pub use registry::AgentRegistry;
pub use sampler::{sample_agents, AgentCounts, AgentSample, MetricsSampler};

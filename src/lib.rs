//! teleingest - ingest remote container environments and mounts
//!
//! teleingest is a library and CLI that lets a local machine "ingest" one
//! container of a remote cluster workload: the container's environment
//! variables, filesystem mounts, and pod network address become available
//! locally, optionally feeding a locally spawned process or container.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  teleingest CLI / HTTP API                       │
//! ├──────────────────────────────────────────────────┤
//! │  ClientSessionFSM (create → run → leave)         │
//! ├──────────────────────────────────────────────────┤
//! │  IngestSessionManager (registry, conflict guard) │
//! ├──────────────────────────────────────────────────┤
//! │  AgentResolver / PodAccessTracker (collaborators)│
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teleingest::agent::StaticResolver;
//! use teleingest::manager::conflict::InterceptRoster;
//! use teleingest::manager::session::{IngestIdentifier, IngestRequest};
//! use teleingest::manager::IngestSessionManager;
//! use teleingest::podaccess::LogOnlyTracker;
//!
//! let resolver = StaticResolver::from_file(
//!     std::path::Path::new("cluster.toml"),
//!     Vec::new(),
//! ).unwrap();
//! let manager = IngestSessionManager::new(
//!     Arc::new(resolver),
//!     Arc::new(LogOnlyTracker),
//!     Arc::new(InterceptRoster::new()),
//! );
//!
//! let rq = IngestRequest {
//!     identifier: IngestIdentifier {
//!         workload: "echo-easy".into(),
//!         container: String::new(),
//!     },
//!     ..Default::default()
//! };
//! let info = manager.ingest(&rq).unwrap();
//! println!("ingested {}/{}", info.workload, info.container);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod podaccess;
pub mod process;

// Re-export main types for convenience
pub use agent::{AgentResolver, AgentSnapshot, StaticResolver};
pub use client::state::{IngestCommand, IngestState};
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result};
pub use manager::session::{IngestIdentifier, IngestInfo, IngestKey, IngestRequest};
pub use manager::{IngestService, IngestSessionManager};
pub use podaccess::{PodAccessDescriptor, PodAccessTracker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

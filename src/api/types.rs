//! API request and response types.
//!
//! Creation requests and ingest snapshots reuse the session DTOs
//! ([`crate::manager::session::IngestRequest`] and
//! [`crate::manager::session::IngestInfo`]) directly.

use crate::manager::session::IngestInfo;
use serde::{Deserialize, Serialize};

/// Query parameters selecting the container of a workload's ingest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerQuery {
    /// Container name; omitted when the workload disambiguates on its own.
    #[serde(default)]
    pub container: String,
}

/// Response for listing active ingests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListIngestsResponse {
    /// Active ingests.
    pub ingests: Vec<IngestInfo>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status, always "ok" when reachable.
    pub status: String,
    /// Server version.
    pub version: String,
}

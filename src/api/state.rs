//! Shared state for API handlers.

use crate::manager::IngestSessionManager;
use std::sync::Arc;

/// State shared by every API handler.
pub struct ApiState {
    /// The session manager behind the API.
    pub manager: Arc<IngestSessionManager>,
}

impl ApiState {
    /// Wrap a session manager for serving.
    pub fn new(manager: Arc<IngestSessionManager>) -> Self {
        Self { manager }
    }
}

//! API endpoint handlers.

use crate::api::error::ApiError;
use crate::api::state::ApiState;
use crate::api::types::{ContainerQuery, HealthResponse, ListIngestsResponse};
use crate::manager::session::{IngestIdentifier, IngestInfo, IngestRequest};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Health check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Create an ingest, or return the existing one for the same key.
pub async fn create_ingest(
    State(state): State<Arc<ApiState>>,
    Json(rq): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestInfo>), ApiError> {
    let info = state.manager.ingest(&rq)?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// List active ingests.
pub async fn list_ingests(State(state): State<Arc<ApiState>>) -> Json<ListIngestsResponse> {
    Json(ListIngestsResponse {
        ingests: state.manager.list(),
    })
}

/// Look up a workload's ingest.
pub async fn get_ingest(
    State(state): State<Arc<ApiState>>,
    Path(workload): Path<String>,
    Query(query): Query<ContainerQuery>,
) -> Result<Json<IngestInfo>, ApiError> {
    let id = IngestIdentifier {
        workload,
        container: query.container,
    };
    Ok(Json(state.manager.get_ingest(&id)?))
}

/// Leave a workload's ingest; responds with its last known snapshot.
pub async fn delete_ingest(
    State(state): State<Arc<ApiState>>,
    Path(workload): Path<String>,
    Query(query): Query<ContainerQuery>,
) -> Result<Json<IngestInfo>, ApiError> {
    let id = IngestIdentifier {
        workload,
        container: query.container,
    };
    Ok(Json(state.manager.leave_ingest(&id)?))
}

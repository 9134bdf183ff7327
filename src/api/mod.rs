//! HTTP API server for teleingest.
//!
//! Exposes the session manager's operations over HTTP so other local
//! tooling can drive ingests without the CLI.
//!
//! # Example
//!
//! ```bash
//! # Start the server
//! teleingest serve --listen 127.0.0.1:8080
//!
//! # Create an ingest
//! curl -X POST http://localhost:8080/api/v1/ingests \
//!   -H "Content-Type: application/json" \
//!   -d '{"identifier": {"workload": "echo-easy"}}'
//! ```

pub mod error;
pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use state::ApiState;

/// Default timeout for API requests. Agent resolution is the only
/// potentially slow step behind any endpoint.
const API_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Create the API router with all endpoints.
///
/// `cors_origins` specifies allowed CORS origins. If empty, defaults to
/// the localhost:8080 variants.
pub fn create_router(state: Arc<ApiState>, cors_origins: Vec<String>) -> Router {
    let health_route = Router::new().route("/health", get(handlers::health));

    let ingest_routes = Router::new()
        .route("/", post(handlers::create_ingest))
        .route("/", get(handlers::list_ingests))
        .route("/:workload", get(handlers::get_ingest))
        .route("/:workload", delete(handlers::delete_ingest))
        .layer(TimeoutLayer::new(Duration::from_secs(
            API_REQUEST_TIMEOUT_SECS,
        )));

    let api_v1 = Router::new().nest("/ingests", ingest_routes);

    let default_origins = || {
        vec![
            "http://localhost:8080"
                .parse()
                .expect("hardcoded CORS origin"),
            "http://127.0.0.1:8080"
                .parse()
                .expect("hardcoded CORS origin"),
        ]
    };
    let origins: Vec<axum::http::HeaderValue> = if cors_origins.is_empty() {
        default_origins()
    } else {
        let mut valid = Vec::new();
        for origin in &cors_origins {
            match origin.parse() {
                Ok(v) => valid.push(v),
                Err(e) => {
                    tracing::warn!(origin = %origin, error = %e, "invalid CORS origin, skipping");
                }
            }
        }
        if valid.is_empty() {
            tracing::warn!("no valid CORS origins provided, falling back to defaults");
            default_origins()
        } else {
            valid
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .merge(health_route)
        .nest("/api/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StaticResolver;
    use crate::manager::conflict::InterceptRoster;
    use crate::manager::IngestSessionManager;
    use crate::podaccess::LogOnlyTracker;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router() -> Router {
        let manifest: crate::agent::ClusterManifest = toml::from_str(
            r#"
[workloads.echo]
kind = "Deployment"
pod-ip = "10.1.0.3"
sftp-port = 2222

[workloads.echo.containers.web]
mount-point = "/tel_app_mounts/web"

[workloads.echo.containers.web.environment]
TEST = "DATA"
"#,
        )
        .unwrap();
        let manager = Arc::new(IngestSessionManager::new(
            Arc::new(StaticResolver::new(manifest, Vec::new())),
            Arc::new(LogOnlyTracker),
            Arc::new(InterceptRoster::new()),
        ));
        create_router(Arc::new(ApiState::new(manager)), Vec::new())
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_ingest(workload: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/ingests")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                "{{\"identifier\": {{\"workload\": \"{workload}\"}}}}"
            )))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_ingest_lifecycle_over_http() {
        let app = router();

        let response = app.clone().oneshot(post_ingest("echo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response.into_body()).await;
        assert_eq!(created["container"], "web");
        assert_eq!(created["environment"]["TEST"], "DATA");

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/ingests/echo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/ingests/echo?container=web")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/api/v1/ingests/echo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_workload_maps_to_internal() {
        let response = router().oneshot(post_ingest("missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_list_ingests() {
        let app = router();
        app.clone().oneshot(post_ingest("echo")).await.unwrap();

        let response = app
            .oneshot(
                Request::get("/api/v1/ingests")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["ingests"].as_array().unwrap().len(), 1);
    }
}

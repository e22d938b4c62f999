use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::StructureError;
use crate::models::Structure;
use crate::structure;

/// Response envelope shared with the frontend: exactly one of `data` or
/// `error` is present.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructureQuery {
    school_year_id: Option<String>,
}

async fn structure_handler(
    State(pool): State<PgPool>,
    Query(query): Query<StructureQuery>,
) -> Result<Json<Envelope<Structure>>, StructureError> {
    // Short-circuit before touching the aggregator.
    let Some(school_year_id) = query.school_year_id.filter(|v| !v.trim().is_empty()) else {
        return Err(StructureError::validation(
            "schoolYearId query parameter is required",
        ));
    };

    let tree = structure::build_structure(&pool, &school_year_id).await?;
    Ok(Json(Envelope::ok(tree)))
}

pub async fn serve(pool: PgPool, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/structure", get(structure_handler))
        .layer(cors)
        .with_state(pool);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_absent_fields() {
        let ok = serde_json::to_value(Envelope::ok(42)).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "data": 42 }));

        let err: Envelope<i32> = Envelope {
            success: false,
            data: None,
            error: Some("boom".to_string()),
        };
        let err = serde_json::to_value(err).unwrap();
        assert_eq!(err, serde_json::json!({ "success": false, "error": "boom" }));
    }
}

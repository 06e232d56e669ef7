//! Admin route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::blockchain::transport::Connector;
use crate::connection::{ConnectionError, NetworkStatus, ReconnectOutcome};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub monitoring: bool,
    pub networks: usize,
    pub healthy_networks: usize,
}

#[derive(Serialize)]
pub struct ReconnectResponse {
    pub network: String,
    pub outcome: ReconnectOutcome,
    pub healthy: bool,
}

/// Error body returned by admin routes.
pub struct ApiError(ConnectionError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ConnectionError::NetworkNotConnected(_) => StatusCode::NOT_FOUND,
            ConnectionError::NetworkUnhealthy(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConnectionError> for ApiError {
    fn from(err: ConnectionError) -> Self {
        Self(err)
    }
}

pub async fn get_status<C: Connector>(State(state): State<AdminState<C>>) -> Json<SystemStatus> {
    let snapshot = state.manager.get_connection_status();
    let networks = snapshot.networks.len();
    let healthy_networks = snapshot.healthy_count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if healthy_networks == networks { "operational" } else { "degraded" },
        monitoring: state.manager.is_monitoring(),
        networks,
        healthy_networks,
    })
}

pub async fn get_networks<C: Connector>(State(state): State<AdminState<C>>) -> Json<Vec<NetworkStatus>> {
    let snapshot = state.manager.get_connection_status();
    Json(snapshot.networks.into_values().collect())
}

pub async fn get_network<C: Connector>(
    State(state): State<AdminState<C>>,
    Path(name): Path<String>,
) -> Result<Json<NetworkStatus>, ApiError> {
    state
        .manager
        .network_status(&name)
        .map(Json)
        .ok_or_else(|| ConnectionError::NetworkNotConnected(name).into())
}

pub async fn force_reconnect<C: Connector>(
    State(state): State<AdminState<C>>,
    Path(name): Path<String>,
) -> Result<Json<ReconnectResponse>, ApiError> {
    let outcome = state.manager.force_reconnect(&name).await?;
    Ok(Json(ReconnectResponse {
        healthy: state.manager.is_network_healthy(&name),
        network: name,
        outcome,
    }))
}

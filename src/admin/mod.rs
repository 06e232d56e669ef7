//! Admin HTTP API.
//!
//! # Routes
//! ```text
//! GET  /admin/status                      → summary of every network
//! GET  /admin/networks                    → status snapshot per network
//! GET  /admin/networks/{name}             → one network, 404 if unknown
//! POST /admin/networks/{name}/reconnect   → force_reconnect, returns the outcome
//! ```
//!
//! Every route requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::blockchain::client::AlloyConnector;
use crate::blockchain::transport::Connector;
use crate::connection::ConnectionManager;

use self::auth::admin_auth_middleware;
use self::handlers::{force_reconnect, get_network, get_networks, get_status};

/// Shared state of the admin routes.
pub struct AdminState<C: Connector = AlloyConnector> {
    pub manager: ConnectionManager<C>,
    pub api_key: Arc<str>,
}

impl<C: Connector> Clone for AdminState<C> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

pub fn admin_router<C: Connector>(manager: ConnectionManager<C>, api_key: &str) -> Router {
    let state = AdminState {
        manager,
        api_key: Arc::from(api_key),
    };

    Router::new()
        .route("/admin/status", get(get_status::<C>))
        .route("/admin/networks", get(get_networks::<C>))
        .route("/admin/networks/{name}", get(get_network::<C>))
        .route("/admin/networks/{name}/reconnect", post(force_reconnect::<C>))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

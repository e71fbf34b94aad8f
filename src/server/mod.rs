//! HTTP API
//!
//! Axum router for the finance endpoints. Everything except `/` and
//! `/health` sits behind bearer-token authentication.
//!
//! Collection routes answer both with and without a trailing slash.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::{IdentityVerifier, JwtVerifier, bearer_token};
use crate::config::Config;
use crate::constants::{listing, server};
use crate::service::{FinanceAssistant, SharedAssistant};
use crate::types::{FinError, Result};
use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assistant: SharedAssistant,
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Default page size for transaction listing
    pub page_size: u32,
    pub backend_name: String,
}

impl AppState {
    pub fn new(assistant: FinanceAssistant, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let backend_name = assistant.backend_name().to_string();
        Self {
            assistant: Arc::new(assistant),
            verifier,
            page_size: listing::DEFAULT_LIMIT,
            backend_name,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, listing::MAX_LIMIT);
        self
    }
}

/// Build the router with default body limit
pub fn build_router(state: AppState) -> Router {
    build_router_with_limit(state, server::BODY_LIMIT_BYTES)
}

pub fn build_router_with_limit(state: AppState, body_limit: usize) -> Router {
    let protected = Router::new()
        .route(
            "/transactions/",
            post(handlers::create_transaction).get(handlers::list_transactions),
        )
        .route(
            "/transactions",
            post(handlers::create_transaction).get(handlers::list_transactions),
        )
        .route(
            "/transactions/{id}",
            put(handlers::update_transaction).delete(handlers::delete_transaction),
        )
        .route(
            "/profile/",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/chat/", post(handlers::chat))
        .route("/chat", post(handlers::chat))
        .layer(middleware::from_fn_with_state(state.clone(), require_identity));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Authentication middleware.
///
/// Requires `Authorization: Bearer <token>`; the verified [`UserId`](crate::types::UserId)
/// is stored in request extensions for handlers.
async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let verified = {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token);

        match token {
            Some(token) => state.verifier.verify(token),
            None => Err(FinError::Unauthorized("missing bearer token".to_string())),
        }
    };

    match verified {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(path = %req.uri().path(), error = %e, "Rejected unauthenticated request");
            Err(ApiError::from(e))
        }
    }
}

/// Open storage, build the backend, and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let assistant = FinanceAssistant::from_config(config)?;
    let verifier = Arc::new(JwtVerifier::new(config.auth.secret()));
    let state =
        AppState::new(assistant, verifier).with_page_size(config.profile.default_page_size);
    let app = build_router_with_limit(state, config.server.body_limit_bytes);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(address = %addr, "fintrack API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

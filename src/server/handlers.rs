//! Route handlers.
//!
//! Handlers extract, delegate to the [`FinanceAssistant`](crate::service::FinanceAssistant),
//! and serialize. The caller's [`UserId`] is put in request extensions by the
//! auth middleware.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use super::error::ApiError;
use crate::types::{NewTransaction, ProfileUpdate, Transaction, UserId, UserProfile};

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> std::result::Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::unprocessable(rejection.body_text()))
}

// =============================================================================
// Public
// =============================================================================

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to AI Finance Manager API" }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend_name,
    }))
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    payload: std::result::Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<Transaction> {
    let input = body(payload)?;
    Ok(Json(state.assistant.create_transaction(&user, input).await?))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Transaction>> {
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(state.page_size);
    Ok(Json(state.assistant.list_transactions(&user, skip, limit).await?))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<Transaction> {
    let input = body(payload)?;
    Ok(Json(state.assistant.update_transaction(&user, id, input).await?))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    state.assistant.delete_transaction(&user, id).await?;
    Ok(Json(json!({ "message": "Transaction deleted" })))
}

// =============================================================================
// Profile
// =============================================================================

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
) -> ApiResult<UserProfile> {
    Ok(Json(state.assistant.profile(&user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let update = body(payload)?;
    Ok(Json(state.assistant.update_profile(&user, update).await?))
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Always 200 once the request is well-formed; model trouble becomes text
pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let request = body(payload)?;
    if request.message.trim().is_empty() {
        return Err(ApiError::unprocessable("message must not be empty"));
    }

    let response = state.assistant.answer(&user, &request.message).await;
    Ok(Json(ChatResponse { response }))
}

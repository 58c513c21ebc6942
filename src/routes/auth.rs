// Authentication and session-management endpoints.
//
// POST /auth/login is the only public route here. The session CRUD
// lives under /auth/login/:jti and applies the ownership-or-admin gate,
// existence first: an unknown jti is a 404 for everyone, a real one
// owned by someone else is a 403.

use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::SharedState;
use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, UpdateSessionRequest};
use crate::sessions::{Session, SessionPatch};

/// POST /auth/login
/// Verifies credentials, registers a session and returns the signed
/// token together with its jti. A wrong username and a wrong password
/// are indistinguishable from the outside, and no session is created
/// on failure.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .db
        .find_user_by_username(&req.username)
        .ok_or(ApiError::InvalidCredentials)?;
    let hash = user.password_hash.as_deref().ok_or(ApiError::InvalidCredentials)?;
    if !auth::verify_password(&req.password, hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let (access_token, jti) = state.auth.issue(&user, state.sessions.as_ref()).await?;
    tracing::info!(user_id = %user.id, jti = %jti, "login");
    Ok(Json(LoginResponse { access_token, jti }))
}

/// GET /auth/profile — the verified claims of the caller.
pub async fn profile(AuthUser(claims): AuthUser) -> Json<Value> {
    Json(json!({ "user": claims }))
}

/// GET /auth/login — the caller's own sessions. Admins manage other
/// sessions by jti, not by listing everyone's.
pub async fn list_sessions(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
) -> Json<Vec<Session>> {
    let mut sessions: Vec<Session> = state
        .sessions
        .list()
        .await
        .into_iter()
        .filter(|s| s.user_id == claims.sub)
        .collect();
    sessions.sort_by_key(|s| s.created_at);
    Json(sessions)
}

/// GET /auth/login/:jti
pub async fn get_session(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Path(jti): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .sessions
        .get(jti)
        .await
        .ok_or_else(|| ApiError::NotFound("session not found".into()))?;
    auth::require_owner_or_admin(&claims, session.user_id)?;
    Ok(Json(session))
}

/// PATCH /auth/login/:jti — label only; owner and jti are immutable.
pub async fn update_session(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Path(jti): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .sessions
        .get(jti)
        .await
        .ok_or_else(|| ApiError::NotFound("session not found".into()))?;
    auth::require_owner_or_admin(&claims, session.user_id)?;

    let updated = state
        .sessions
        .update(jti, SessionPatch { label: req.label })
        .await
        .ok_or_else(|| ApiError::NotFound("session not found".into()))?;
    Ok(Json(updated))
}

/// DELETE /auth/login/:jti — logout. Tokens embedding this jti stop
/// working immediately, even though their signature and expiry remain
/// valid. Deleting twice reports not-found, not an error.
pub async fn delete_session(
    State(state): State<SharedState>,
    AuthUser(claims): AuthUser,
    Path(jti): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = state
        .sessions
        .get(jti)
        .await
        .ok_or_else(|| ApiError::NotFound("session not found".into()))?;
    auth::require_owner_or_admin(&claims, session.user_id)?;

    let removed = state.sessions.delete(jti).await;
    tracing::info!(jti = %jti, user_id = %session.user_id, "session revoked");
    Ok(Json(json!({ "ok": removed })))
}

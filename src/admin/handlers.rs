use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreateUserRequest, MessageResponse, UpdateRoleRequest, UserListResponse, UserResponse,
};
use crate::{
    auth::extractors::AdminUser,
    error::ApiError,
    state::AppState,
    users::{
        service::{create_user as store_user, validate_new_credentials},
        Role,
    },
};

const ROLE_MESSAGE: &str = r#"Role must be "admin" or "user"."#;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/users/:id/role", patch(update_role))
}

/// Ids that do not parse cannot name a stored user.
fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("User not found."))
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request(ROLE_MESSAGE))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(UserListResponse { users }))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(payload) = payload?;
    let creds = validate_new_credentials(payload.email.as_deref(), payload.password.as_deref())?;
    let role = payload
        .role
        .as_deref()
        .map(parse_role)
        .transpose()?
        .unwrap_or_default();

    let user = store_user(state.users.as_ref(), creds, payload.name.as_deref(), role).await?;
    info!(admin_id = %admin.identity.id, user_id = %user.id, role = %user.role, "admin created user");
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    if !state.users.delete(id).await? {
        warn!(user_id = %id, "delete of unknown user");
        return Err(ApiError::not_found("User not found."));
    }
    info!(admin_id = %admin.identity.id, user_id = %id, "admin deleted user");
    Ok(Json(MessageResponse {
        message: "User deleted successfully.",
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    let role = payload
        .role
        .as_deref()
        .ok_or_else(|| ApiError::bad_request(ROLE_MESSAGE))
        .and_then(parse_role)?;
    let id = parse_user_id(&id)?;

    let user = state
        .users
        .update_role(id, role)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found."))?;
    info!(admin_id = %admin.identity.id, user_id = %id, %role, "admin changed role");
    Ok(Json(UserResponse { user }))
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::Identity,
        dto::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
        extractors::AuthUser,
        password::{verify_dummy, verify_password},
    },
    error::ApiError,
    state::AppState,
    users::{
        normalize_email,
        repo::RepoError,
        service::{create_user, validate_new_credentials},
        Role, User,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

fn issue(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let identity = Identity::from(user);
    let token = state.jwt.sign(&identity).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })?;
    Ok(AuthResponse {
        token,
        user: identity,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    let creds = validate_new_credentials(payload.email.as_deref(), payload.password.as_deref())
        .map_err(|e| {
            warn!(reason = %e, "registration rejected");
            e
        })?;

    let user = create_user(state.users.as_ref(), creds, payload.name.as_deref(), Role::User)
        .await
        .map_err(|e| match e {
            RepoError::DuplicateEmail => {
                warn!("email already registered");
                ApiError::Conflict("An account with this email already exists.".into())
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue(&state, &user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required."));
    }

    let invalid = || ApiError::Unauthorized("Invalid credentials.".into());

    let Some(user) = state.users.find_by_email(&email).await? else {
        verify_dummy(&password);
        warn!(email = %email, "login unknown email");
        return Err(invalid());
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue(&state, &user)?))
}

#[instrument(skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user_id = claims.identity.id;
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "token subject no longer exists");
            ApiError::not_found("User not found.")
        })?;
    Ok(Json(MeResponse { user }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        auth::password::verifications,
        state::AppState,
        test_support::{seed_user, send, token_for},
        users::{memory::MemoryUserRepository, repo::UserRepository, Role},
    };

    #[tokio::test]
    async fn register_then_login_returns_matching_identity() {
        let state = AppState::fake();

        let (status, body) = send(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": " Dana ", "email": " Dana@Example.com ", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "dana@example.com");
        assert_eq!(body["user"]["name"], "Dana");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password").is_none());

        let (status, login) = send(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "DANA@example.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["user"], body["user"]);

        let token = login["token"].as_str().unwrap();
        let claims = state.jwt.verify(token).expect("token verifies");
        assert_eq!(claims.identity.email, "dana@example.com");
        assert_eq!(claims.identity.id.to_string(), body["user"]["id"]);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_without_second_record() {
        let repo = Arc::new(MemoryUserRepository::new());
        let state = AppState::fake_with(repo.clone());
        let body = json!({ "email": "eve@example.com", "password": "secret1" });

        let (first, _) = send(&state, Method::POST, "/api/auth/register", None, Some(body)).await;
        assert_eq!(first, StatusCode::CREATED);

        let (second, err) = send(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "  EVE@example.com", "password": "another1" })),
        )
        .await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(err["message"], "An account with this email already exists.");
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let state = AppState::fake();
        let cases = [
            json!({ "password": "secret1" }),
            json!({ "email": "a@x.io" }),
            json!({ "email": "a@x.io", "password": "12345" }),
            json!({ "email": "not-an-email", "password": "secret1" }),
        ];
        for case in cases {
            let (status, body) =
                send(&state, Method::POST, "/api/auth/register", None, Some(case)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn login_does_not_reveal_which_part_was_wrong() {
        let state = AppState::fake();
        send(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "finn@example.com", "password": "secret1" })),
        )
        .await;

        let (unknown, a) = send(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
        )
        .await;
        let (wrong, b) = send(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "finn@example.com", "password": "wrong-one" })),
        )
        .await;

        assert_eq!(unknown, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, StatusCode::UNAUTHORIZED);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn unknown_email_costs_one_verification_like_a_wrong_password() {
        let state = AppState::fake();
        send(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "hana@example.com", "password": "secret1" })),
        )
        .await;

        for email in ["ghost@example.com", "hana@example.com"] {
            let before = verifications();
            let (status, _) = send(
                &state,
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "wrong-one" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(verifications() - before, 1, "{email}");
        }
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let state = AppState::fake();
        let (status, _) = send(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "finn@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_a_valid_token() {
        let state = AppState::fake();

        let (status, body) = send(&state, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied. No token provided.");

        let (status, body) =
            send(&state, Method::GET, "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token.");
    }

    #[tokio::test]
    async fn me_returns_stored_user_or_404() {
        let repo = Arc::new(MemoryUserRepository::new());
        let state = AppState::fake_with(repo.clone());
        let user = seed_user(&repo, "gina@example.com", Role::User).await;
        let token = token_for(&state, &user);

        let (status, body) = send(&state, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "gina@example.com");
        assert!(body["user"].get("passwordHash").is_none());

        repo.delete(user.id).await.unwrap();
        let (status, _) = send(&state, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

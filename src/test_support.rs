use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::claims::Identity,
    state::AppState,
    users::{memory::MemoryUserRepository, Role, User},
};

/// Runs one request through the full router and returns status plus JSON body.
pub async fn send(
    state: &AppState,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request");

    let resp = build_app(state.clone()).oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

pub fn user_at(email: &str, role: Role, created_at: OffsetDateTime) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.into(),
        password_hash: "not-a-real-hash".into(),
        role,
        name: String::new(),
        created_at,
        updated_at: created_at,
    }
}

pub async fn seed_user(repo: &MemoryUserRepository, email: &str, role: Role) -> User {
    let user = user_at(email, role, OffsetDateTime::now_utc());
    repo.insert(user.clone()).await.expect("seed user");
    user
}

pub fn token_for(state: &AppState, user: &User) -> String {
    state.jwt.sign(&Identity::from(user)).expect("sign")
}

use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod report;

pub fn router() -> Router<AppState> {
    handlers::analytics_routes()
}

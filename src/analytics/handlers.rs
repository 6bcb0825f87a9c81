use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::report::{fill_months, AnalyticsReport, Overview, RoleDistribution, Windows};
use crate::{
    auth::extractors::AdminUser,
    error::ApiError,
    state::AppState,
    users::{repo::UserRepository, Role},
};

pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

#[instrument(skip_all)]
pub async fn get_analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let report = build_report(state.users.as_ref(), OffsetDateTime::now_utc()).await?;
    Ok(Json(report))
}

/// Gathers every count the dashboard shows as of `now`.
pub async fn build_report(
    users: &dyn UserRepository,
    now: OffsetDateTime,
) -> Result<AnalyticsReport, ApiError> {
    let windows = Windows::at(now)?;

    let (total, admins, new_this_month, new_this_week, buckets) = tokio::try_join!(
        users.count_all(),
        users.count_by_role(Role::Admin),
        users.count_created_since(windows.month_start),
        users.count_created_since(windows.week_start),
        users.monthly_signups_since(windows.history_start),
    )?;
    debug!(total, admins, buckets = buckets.len(), "analytics counts loaded");

    Ok(AnalyticsReport {
        overview: Overview {
            total_users: total,
            admin_count: admins,
            user_count: total - admins,
            new_this_month,
            new_this_week,
        },
        monthly_signups: fill_months(&windows, &buckets),
        role_distribution: RoleDistribution {
            admin: admins,
            user: total - admins,
        },
    })
}

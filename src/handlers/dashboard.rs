//! Dashboard, notifications and health endpoints

use crate::domain::aggregate::{EnrichedPeriod, Summary};
use crate::domain::{aggregate, notifications};
use crate::handlers::{current_snapshot, json_ok, AppState};
use crate::source::ContractSource;
use axum::{extract::State, http::StatusCode, response::Response, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

/// Number of notices shown on the dashboard card
const DASHBOARD_NOTICES: usize = 10;

#[derive(Debug, Serialize)]
pub struct Dashboard<'a> {
    pub summary: Summary,
    pub notifications: Vec<&'a EnrichedPeriod>,
    pub fetched_at: DateTime<Utc>,
    pub failed_period_fetches: usize,
}

/// Get dashboard statistics
pub async fn get_dashboard<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let aggregation = aggregate(&snapshot.contracts, &snapshot.periods, now);

    let mut notices = notifications(&aggregation);
    notices.truncate(DASHBOARD_NOTICES);

    Ok(json_ok(
        StatusCode::OK,
        Dashboard {
            summary: aggregation.summary.clone(),
            notifications: notices,
            fetched_at: snapshot.fetched_at,
            failed_period_fetches: snapshot.failed_period_fetches,
        },
    ))
}

/// All upcoming and overdue periods, overdue first
pub async fn list_notifications<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let aggregation = aggregate(&snapshot.contracts, &snapshot.periods, now);
    Ok(json_ok(StatusCode::OK, notifications(&aggregation)))
}

pub async fn health<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<serde_json::Value> {
    let snapshot = state.store.current().await;
    Json(json!({
        "status": "ok",
        "snapshot_loaded": snapshot.is_some(),
        "fetched_at": snapshot.map(|s| s.fetched_at),
    }))
}

//! Period (delivery milestone) handlers

use crate::auth::Session;
use crate::domain::aggregate::EnrichedPeriod;
use crate::domain::filter::SortQuery;
use crate::domain::{aggregate, filter_periods, sort_records, Aggregation, PeriodFilter};
use crate::handlers::contracts::{ensure_editable, find_contract};
use crate::handlers::{current_snapshot, json_error, json_ok, upstream_error, AppState};
use crate::models::{Period, PeriodInput, RecordId};
use crate::source::{ContractSource, Snapshot};
use crate::validation::validate_period_input;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use chrono::Utc;

pub(crate) fn filtered_periods<'a>(
    aggregation: &'a Aggregation,
    filter: &PeriodFilter,
    sort: &SortQuery,
) -> Result<Vec<&'a EnrichedPeriod>, Response> {
    let mut periods = filter_periods(&aggregation.periods, filter);
    if let Some(spec) = sort.spec() {
        sort_records(&mut periods, &spec)
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }
    Ok(periods)
}

fn find_period<'a>(snapshot: &'a Snapshot, id: &RecordId) -> Result<&'a Period, Response> {
    snapshot
        .periods
        .iter()
        .find(|p| &p.id == id)
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Period not found"))
}

/// Periods of read-only contracts cannot be changed. Orphan periods have no
/// owner to check and stay editable.
fn ensure_parent_editable(snapshot: &Snapshot, period: &Period) -> Result<(), Response> {
    match snapshot.contracts.iter().find(|c| c.id == period.contract_id) {
        Some(contract) => ensure_editable(contract),
        None => Ok(()),
    }
}

/// List enriched periods across all contracts
pub async fn list_periods<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<PeriodFilter>,
    Query(sort): Query<SortQuery>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let aggregation = aggregate(&snapshot.contracts, &snapshot.periods, now);
    let periods = filtered_periods(&aggregation, &filter, &sort)?;
    Ok(json_ok(StatusCode::OK, periods))
}

/// Add a period to a contract
pub async fn create_period<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(session): Extension<Session>,
    Path(contract_id): Path<String>,
    Json(input): Json<PeriodInput>,
) -> Result<Response, Response> {
    let snapshot = current_snapshot(&state).await?;
    let contract_id = RecordId::new(contract_id);
    ensure_editable(find_contract(&snapshot, &contract_id)?)?;

    let payload = validate_period_input(&input, &contract_id)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let record = state
        .source
        .create_period(&session, &payload)
        .await
        .map_err(|e| upstream_error("create period for contract", Some(&contract_id), e))?;

    let mut period = Period::from(record);
    if period.contract_id.is_empty() {
        period.contract_id = contract_id;
    }
    tracing::info!("Period {} created for contract {}", period.id, period.contract_id);
    state.focus.signal();
    Ok(json_ok(StatusCode::CREATED, period))
}

/// Replace a period's fields
pub async fn update_period<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(input): Json<PeriodInput>,
) -> Result<Response, Response> {
    let snapshot = current_snapshot(&state).await?;
    let id = RecordId::new(id);
    let existing = find_period(&snapshot, &id)?;
    ensure_parent_editable(&snapshot, existing)?;

    let payload = validate_period_input(&input, &existing.contract_id)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let record = state
        .source
        .update_period(&session, &id, &payload)
        .await
        .map_err(|e| upstream_error("update period", Some(&id), e))?;

    tracing::info!("Period {} updated", id);
    state.focus.signal();
    Ok(json_ok(StatusCode::OK, Period::from(record)))
}

/// Hard delete a period
pub async fn delete_period<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let snapshot = current_snapshot(&state).await?;
    let id = RecordId::new(id);
    ensure_parent_editable(&snapshot, find_period(&snapshot, &id)?)?;

    state
        .source
        .delete_period(&session, &id)
        .await
        .map_err(|e| upstream_error("delete period", Some(&id), e))?;

    tracing::info!("Period {} deleted", id);
    state.focus.signal();
    Ok(json_ok(StatusCode::OK, serde_json::json!({ "id": id })))
}

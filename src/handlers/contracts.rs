//! Contract list, detail and write handlers

use crate::auth::Session;
use crate::domain::aggregate::{ContractRow, EnrichedPeriod};
use crate::domain::filter::SortQuery;
use crate::domain::{aggregate, contract_rows, filter_contracts, sort_records, ContractFilter};
use crate::handlers::{current_snapshot, json_error, json_ok, upstream_error, AppState};
use crate::models::{Contract, ContractInput, ContractPayload, ContractStatus, RecordId};
use crate::source::{ContractSource, Snapshot};
use crate::validation::validate_contract_input;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ContractDetail<'a> {
    #[serde(flatten)]
    pub row: ContractRow<'a>,
    pub permits_edit: bool,
    pub periods: Vec<&'a EnrichedPeriod>,
}

/// Filter and sort the snapshot's contracts into list rows.
pub(crate) fn filtered_rows<'a>(
    snapshot: &'a Snapshot,
    filter: &ContractFilter,
    sort: &SortQuery,
    now: DateTime<Utc>,
) -> Result<Vec<ContractRow<'a>>, Response> {
    let contracts = filter_contracts(&snapshot.contracts, filter, now);
    let mut rows = contract_rows(&contracts, &snapshot.periods, now);
    if let Some(spec) = sort.spec() {
        sort_records(&mut rows, &spec)
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }
    Ok(rows)
}

/// First contract with the given id, or 404
pub(crate) fn find_contract<'a>(snapshot: &'a Snapshot, id: &RecordId) -> Result<&'a Contract, Response> {
    snapshot
        .contracts
        .iter()
        .find(|c| &c.id == id)
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Contract not found"))
}

pub(crate) fn ensure_editable(contract: &Contract) -> Result<(), Response> {
    if contract.permits_edit() {
        Ok(())
    } else {
        Err(json_error(
            StatusCode::CONFLICT,
            format!(
                "Contract is {} and cannot be modified",
                contract.status.code().to_lowercase()
            ),
        ))
    }
}

// =============================================================================
// Read Endpoints
// =============================================================================

/// List contracts with optional filters and sort
pub async fn list_contracts<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ContractFilter>,
    Query(sort): Query<SortQuery>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let rows = filtered_rows(&snapshot, &filter, &sort, now)?;
    Ok(json_ok(StatusCode::OK, rows))
}

/// Get a contract with its enriched periods
pub async fn get_contract<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let id = RecordId::new(id);
    let contract = find_contract(&snapshot, &id)?;

    let aggregation = aggregate(&snapshot.contracts, &snapshot.periods, now);
    let periods = aggregation
        .periods
        .iter()
        .filter(|p| p.period.contract_id == id)
        .collect();
    let row = contract_rows(&[contract], &snapshot.periods, now)
        .into_iter()
        .next()
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Contract not found"))?;

    Ok(json_ok(
        StatusCode::OK,
        ContractDetail {
            row,
            permits_edit: contract.permits_edit(),
            periods,
        },
    ))
}

// =============================================================================
// Write Endpoints
// =============================================================================

/// Create a new contract
pub async fn create_contract<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(session): Extension<Session>,
    Json(input): Json<ContractInput>,
) -> Result<Response, Response> {
    let payload = validate_contract_input(&input, None)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let record = state
        .source
        .create_contract(&session, &payload)
        .await
        .map_err(|e| upstream_error("create contract", None, e))?;

    let contract = Contract::from(record);
    tracing::info!("Contract {} created ({})", contract.id, payload.contract_no);
    state.focus.signal();
    Ok(json_ok(StatusCode::CREATED, contract))
}

/// Replace the editable fields of a contract
pub async fn update_contract<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(input): Json<ContractInput>,
) -> Result<Response, Response> {
    let snapshot = current_snapshot(&state).await?;
    let id = RecordId::new(id);
    let existing = find_contract(&snapshot, &id)?;
    ensure_editable(existing)?;

    let payload = validate_contract_input(&input, Some(existing.status))
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let record = state
        .source
        .update_contract(&session, &id, &payload)
        .await
        .map_err(|e| upstream_error("update contract", Some(&id), e))?;

    tracing::info!("Contract {} updated", id);
    state.focus.signal();
    Ok(json_ok(StatusCode::OK, Contract::from(record)))
}

/// Soft delete: the contract is kept upstream with status DELETED
pub async fn delete_contract<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let snapshot = current_snapshot(&state).await?;
    let id = RecordId::new(id);
    let contract = find_contract(&snapshot, &id)?;
    ensure_editable(contract)?;

    let payload = ContractPayload::with_status(contract, ContractStatus::Deleted);
    let record = state
        .source
        .update_contract(&session, &id, &payload)
        .await
        .map_err(|e| upstream_error("delete contract", Some(&id), e))?;

    tracing::info!("Contract {} marked deleted", id);
    state.focus.signal();
    Ok(json_ok(StatusCode::OK, Contract::from(record)))
}

//! CSV and printable report downloads

use crate::domain::aggregate;
use crate::domain::filter::SortQuery;
use crate::domain::{ContractFilter, PeriodFilter};
use crate::export::{contract_table, period_table, to_csv, to_html, ExportError};
use crate::handlers::contracts::filtered_rows;
use crate::handlers::periods::filtered_periods;
use crate::handlers::{current_snapshot, json_error, AppState};
use crate::source::ContractSource;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;

fn csv_download(filename: &str, body: Result<String, ExportError>) -> Response {
    match body {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to build {}: {}", filename, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build report")
        }
    }
}

/// Contract list as CSV, with the same filters as the list view
pub async fn contracts_csv<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ContractFilter>,
    Query(sort): Query<SortQuery>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let rows = filtered_rows(&snapshot, &filter, &sort, now)?;
    let filename = format!("contracts-{}.csv", now.format("%Y%m%d"));
    Ok(csv_download(&filename, to_csv(&contract_table(&rows))))
}

pub async fn contracts_print<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ContractFilter>,
    Query(sort): Query<SortQuery>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let rows = filtered_rows(&snapshot, &filter, &sort, now)?;
    Ok(Html(to_html(&contract_table(&rows), now)).into_response())
}

pub async fn periods_csv<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<PeriodFilter>,
    Query(sort): Query<SortQuery>,
) -> Result<Response, Response> {
    let now = Utc::now();
    let snapshot = current_snapshot(&state).await?;
    let aggregation = aggregate(&snapshot.contracts, &snapshot.periods, now);
    let periods = filtered_periods(&aggregation, &filter, &sort)?;
    let filename = format!("periods-{}.csv", now.format("%Y%m%d"));
    Ok(csv_download(&filename, to_csv(&period_table(&periods))))
}

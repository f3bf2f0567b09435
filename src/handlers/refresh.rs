use crate::handlers::{json_ok, AppState};
use crate::source::ContractSource;
use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

/// Focus refresh requested by the SPA when its window regains focus.
/// The reload happens in the background; the response does not wait for it.
pub async fn request_refresh<S: ContractSource + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    state.focus.signal();
    json_ok(StatusCode::ACCEPTED, json!({ "queued": true }))
}

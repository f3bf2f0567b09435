//! HTTP request handlers

pub mod contracts;
pub mod dashboard;
pub mod middleware;
pub mod periods;
pub mod refresh;
pub mod reports;

use crate::models::{ApiResponse, RecordId};
use crate::scheduler::FocusHandle;
use crate::source::{ContractSource, Snapshot, SnapshotStore, SourceError};
use axum::{
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState<S> {
    /// Upstream API used for writes
    pub source: Arc<S>,
    pub store: SnapshotStore,
    pub focus: FocusHandle,
    pub is_production: bool,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            store: self.store.clone(),
            focus: self.focus.clone(),
            is_production: self.is_production,
        }
    }
}

/// Routes mounted under `/api`. Everything except the health check requires a
/// session.
pub fn api_routes<S: ContractSource + 'static>() -> Router<AppState<S>> {
    let protected = Router::new()
        // Contracts
        .route(
            "/contracts",
            get(contracts::list_contracts::<S>).post(contracts::create_contract::<S>),
        )
        .route(
            "/contracts/:id",
            get(contracts::get_contract::<S>)
                .put(contracts::update_contract::<S>)
                .delete(contracts::delete_contract::<S>),
        )
        .route("/contracts/:id/periods", post(periods::create_period::<S>))
        // Periods
        .route("/periods", get(periods::list_periods::<S>))
        .route(
            "/periods/:id",
            put(periods::update_period::<S>).delete(periods::delete_period::<S>),
        )
        // Derived views
        .route("/notifications", get(dashboard::list_notifications::<S>))
        .route("/dashboard", get(dashboard::get_dashboard::<S>))
        // Reports
        .route("/reports/contracts.csv", get(reports::contracts_csv::<S>))
        .route("/reports/contracts/print", get(reports::contracts_print::<S>))
        .route("/reports/periods.csv", get(reports::periods_csv::<S>))
        .route("/refresh", post(refresh::request_refresh::<S>))
        .route_layer(from_fn(middleware::require_session));

    Router::new()
        .route("/health", get(dashboard::health::<S>))
        .merge(protected)
}

// =============================================================================
// Response helpers
// =============================================================================

pub(crate) fn json_ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::success(data))).into_response()
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// Latest snapshot, or 503 while the first load is still outstanding
pub(crate) async fn current_snapshot<S>(state: &AppState<S>) -> Result<Arc<Snapshot>, Response> {
    state.store.current().await.ok_or_else(|| {
        json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Contract data is still loading. Please try again shortly.",
        )
    })
}

/// Map an upstream write failure. Client errors are passed through, the rest
/// become 502.
pub(crate) fn upstream_error(action: &str, id: Option<&RecordId>, e: SourceError) -> Response {
    match id {
        Some(id) => tracing::error!("Failed to {} {}: {}", action, id, e),
        None => tracing::error!("Failed to {}: {}", action, e),
    }
    match e.status().and_then(|s| StatusCode::from_u16(s).ok()) {
        Some(status) if status.is_client_error() => {
            json_error(status, format!("Upstream API rejected the request to {}", action))
        }
        _ => json_error(
            StatusCode::BAD_GATEWAY,
            format!("Failed to {}", action),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, ContractRecord, Period, PeriodStatus};
    use crate::scheduler::RefreshScheduler;
    use crate::source::snapshot::tests::FakeSource;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn contract(id: &str, no: &str, status: &str, end: &str) -> Contract {
        Contract::from(ContractRecord {
            id: Some(RecordId::new(id)),
            contract_no: Some(no.into()),
            contact_name: Some(format!("Contact {}", id)),
            department: Some("IT".into()),
            status: Some(status.into()),
            start_date: Some("1999-01-01".into()),
            end_date: Some(end.into()),
            ..Default::default()
        })
    }

    fn period(id: &str, contract_id: &str, due_in: Duration, status: PeriodStatus) -> Period {
        Period {
            id: RecordId::new(id),
            contract_id: RecordId::new(contract_id),
            period_no: id.trim_start_matches('p').to_string(),
            due_date: Some(Utc::now() + due_in),
            alert_days: 7,
            status,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            contracts: vec![
                contract("1", "CN-001", "ACTIVE", "2999-12-31"),
                contract("2", "CN-002", "CANCELLED", "2999-12-31"),
                contract("3", "CN-003", "ACTIVE", "2000-01-01"),
            ],
            periods: vec![
                period("p1", "1", Duration::hours(60), PeriodStatus::Pending),
                period("p2", "1", -Duration::days(3), PeriodStatus::InProgress),
                period("p3", "2", -Duration::days(3), PeriodStatus::Done),
            ],
            fetched_at: Utc::now(),
            failed_period_fetches: 0,
        }
    }

    async fn app(snapshot: Option<Snapshot>) -> (Router, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        let store = SnapshotStore::new();
        if let Some(snapshot) = snapshot {
            store.replace(snapshot).await;
        }
        let (_scheduler, focus) = RefreshScheduler::new(std::time::Duration::from_secs(3600));
        let state = AppState {
            source: source.clone(),
            store,
            focus,
            is_production: false,
        };
        let router = Router::new().nest("/api", api_routes()).with_state(state);
        (router, source)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap()
    }

    fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer test-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn writes(source: &FakeSource) -> Vec<String> {
        source.writes.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_health_needs_no_session() {
        let (app, _) = app(Some(snapshot())).await;
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["snapshot_loaded"], json!(true));
    }

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let (app, _) = app(Some(snapshot())).await;
        let request = Request::builder()
            .uri("/api/contracts")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["success"], json!(false));
    }

    #[tokio::test]
    async fn test_session_cookie_is_accepted() {
        let (app, _) = app(Some(snapshot())).await;
        let request = Request::builder()
            .uri("/api/contracts")
            .header(header::COOKIE, "ct_session=abc")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_snapshot_is_unavailable() {
        let (app, _) = app(None).await;
        let response = app.oneshot(get("/api/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_list_contracts_with_derived_expiry_filter() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app
            .clone()
            .oneshot(get("/api/contracts"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);

        let response = app
            .oneshot(get("/api/contracts?status=EXPIRED"))
            .await
            .unwrap();
        let body = body_json(response).await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!("3"));
        assert_eq!(rows[0]["display_status"], json!("EXPIRED"));
        assert_eq!(rows[0]["status"], json!("ACTIVE"));
    }

    #[tokio::test]
    async fn test_contract_rows_keep_stored_title() {
        let mut snapshot = snapshot();
        snapshot.contracts[0].title = Some("Server maintenance".into());
        let (app, _) = app(Some(snapshot)).await;

        let response = app
            .clone()
            .oneshot(get("/api/contracts?sort=display_title"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let raw = body_text(response).await;
        assert_eq!(raw.matches("\"title\":").count(), 3);

        let body: Value = serde_json::from_str(&raw).unwrap();
        let row = &body["data"][0];
        assert_eq!(row["title"], json!("Server maintenance"));
        assert_eq!(row["display_title"], json!("Contact 1"));

        let response = app.oneshot(get("/api/contracts/1")).await.unwrap();
        let raw = body_text(response).await;
        assert_eq!(raw.matches("\"title\":").count(), 1);
    }

    #[tokio::test]
    async fn test_list_contracts_sorting() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app
            .clone()
            .oneshot(get("/api/contracts?sort=contract_no&order=desc"))
            .await
            .unwrap();
        let body = body_json(response).await;
        let numbers: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["contract_no"].as_str().unwrap())
            .collect();
        assert_eq!(numbers, vec!["CN-003", "CN-002", "CN-001"]);

        let response = app
            .oneshot(get("/api/contracts?sort=shoe_size"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_contract_detail() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app
            .clone()
            .oneshot(get("/api/contracts/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["permits_edit"], json!(true));
        assert_eq!(body["data"]["period_count"], json!(2));
        assert_eq!(body["data"]["periods"].as_array().unwrap().len(), 2);

        let response = app.oneshot(get("/api/contracts/42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_contract_validates_then_forwards() {
        let (app, source) = app(Some(snapshot())).await;
        let response = app
            .clone()
            .oneshot(send_json("POST", "/api/contracts", json!({ "contact_name": "x" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(writes(&source).is_empty());

        let response = app
            .oneshot(send_json(
                "POST",
                "/api/contracts",
                json!({ "contract_no": "CN-9", "alert_emails": "a@example.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(writes(&source), vec!["create_contract CN-9"]);
    }

    #[tokio::test]
    async fn test_read_only_contract_rejects_edits() {
        let (app, source) = app(Some(snapshot())).await;
        let response = app
            .clone()
            .oneshot(send_json("PUT", "/api/contracts/2", json!({ "contract_no": "CN-002" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/periods/p3")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(writes(&source).is_empty());
    }

    #[tokio::test]
    async fn test_derived_expiry_still_permits_edit() {
        let (app, source) = app(Some(snapshot())).await;
        let response = app
            .oneshot(send_json("PUT", "/api/contracts/3", json!({ "contract_no": "CN-003" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Omitting the status keeps the stored one.
        assert_eq!(writes(&source), vec!["update_contract 3 ACTIVE"]);
    }

    #[tokio::test]
    async fn test_edit_with_explicit_status() {
        let (app, source) = app(Some(snapshot())).await;
        let response = app
            .oneshot(send_json(
                "PUT",
                "/api/contracts/1",
                json!({ "contract_no": "CN-001", "status": "เสร็จสิ้น" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(writes(&source), vec!["update_contract 1 COMPLETED"]);
    }

    #[tokio::test]
    async fn test_upstream_client_error_is_passed_through() {
        let (app, source) = app(Some(snapshot())).await;
        *source.reject_writes.lock().unwrap() = Some(422);
        let response = app
            .clone()
            .oneshot(send_json("PUT", "/api/contracts/1", json!({ "contract_no": "CN-001" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["success"], json!(false));

        *source.reject_writes.lock().unwrap() = Some(404);
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/periods/p1")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(writes(&source).is_empty());
    }

    #[tokio::test]
    async fn test_upstream_server_error_is_bad_gateway() {
        let (app, source) = app(Some(snapshot())).await;
        *source.reject_writes.lock().unwrap() = Some(500);
        let response = app
            .clone()
            .oneshot(send_json("POST", "/api/contracts", json!({ "contract_no": "CN-9" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Failed to create contract"));

        *source.reject_writes.lock().unwrap() = Some(503);
        let response = app
            .oneshot(send_json(
                "POST",
                "/api/contracts/1/periods",
                json!({ "period_no": "7", "due_date": "2030-01-01" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(writes(&source).is_empty());
    }

    #[tokio::test]
    async fn test_delete_contract_is_soft() {
        let (app, source) = app(Some(snapshot())).await;
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/contracts/1")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], json!("DELETED"));
        assert_eq!(writes(&source), vec!["update_contract 1 DELETED"]);
    }

    #[tokio::test]
    async fn test_period_writes() {
        let (app, source) = app(Some(snapshot())).await;
        let response = app
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/contracts/1/periods",
                json!({ "period_no": 5, "due_date": "2030-01-01", "alert_days": "14" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["contract_id"], json!("1"));
        assert_eq!(body["data"]["alert_days"], json!(14));

        let response = app
            .clone()
            .oneshot(send_json(
                "PUT",
                "/api/periods/p1",
                json!({ "period_no": "1", "due_date": "2030-02-01", "status": "done" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/periods/p2")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            writes(&source),
            vec![
                "create_period 1 5",
                "update_period p1 เสร็จสิ้น",
                "delete_period p2",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_period_is_rejected() {
        let (app, source) = app(Some(snapshot())).await;
        let response = app
            .oneshot(send_json(
                "POST",
                "/api/contracts/1/periods",
                json!({ "period_no": "1", "due_date": "2030-01-01", "alert_days": 400 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(writes(&source).is_empty());
    }

    #[tokio::test]
    async fn test_notifications_overdue_first() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app.oneshot(get("/api/notifications")).await.unwrap();
        let body = body_json(response).await;
        let notices = body["data"].as_array().unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0]["id"], json!("p2"));
        assert_eq!(notices[0]["classification"]["notice"], json!("overdue"));
        assert_eq!(notices[1]["id"], json!("p1"));
        assert_eq!(notices[1]["classification"]["notice"], json!("upcoming"));
    }

    #[tokio::test]
    async fn test_dashboard_summary() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app.oneshot(get("/api/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = &body_json(response).await["data"]["summary"];
        assert_eq!(summary["total_contracts"], json!(3));
        assert_eq!(summary["total_periods"], json!(3));
        assert_eq!(summary["upcoming"], json!(1));
        assert_eq!(summary["overdue"], json!(1));
        assert_eq!(
            summary["contracts_by_status"],
            json!({ "ACTIVE": 1, "CANCELLED": 1, "EXPIRED": 1 })
        );
    }

    #[tokio::test]
    async fn test_dashboard_counts_match_status_filter() {
        let mut snapshot = snapshot();
        snapshot
            .contracts
            .push(contract("4", "CN-004", "DELETED", "2001-01-01"));
        snapshot
            .contracts
            .push(contract("5", "CN-005", "DELETED", "2999-12-31"));
        let (app, _) = app(Some(snapshot)).await;

        let response = app.clone().oneshot(get("/api/dashboard")).await.unwrap();
        let counts = body_json(response).await["data"]["summary"]["contracts_by_status"].clone();
        for code in ["ACTIVE", "CANCELLED", "EXPIRED", "DELETED", "CREATED"] {
            let response = app
                .clone()
                .oneshot(get(&format!("/api/contracts?status={}", code)))
                .await
                .unwrap();
            let listed = body_json(response).await["data"].as_array().unwrap().len();
            assert_eq!(counts[code].as_u64().unwrap_or(0), listed as u64, "{}", code);
        }
        assert_eq!(counts["EXPIRED"], json!(2));
        assert_eq!(counts["DELETED"], json!(1));
    }

    #[tokio::test]
    async fn test_period_list_filter() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app
            .oneshot(get("/api/periods?status=open&sort=due_date"))
            .await
            .unwrap();
        let body = body_json(response).await;
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_contracts_csv_download() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app
            .oneshot(get("/api/reports/contracts.csv?department=IT"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let csv = body_text(response).await;
        assert!(csv.starts_with('\u{FEFF}'));
        // Header plus one line per contract.
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains("\"CN-003\""));
    }

    #[tokio::test]
    async fn test_print_view_is_html() {
        let (app, _) = app(Some(snapshot())).await;
        let response = app
            .oneshot(get("/api/reports/contracts/print"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<td>CN-001</td>"));
    }

    #[tokio::test]
    async fn test_refresh_is_accepted() {
        let (app, _) = app(Some(snapshot())).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/refresh")
            .header(header::AUTHORIZATION, "Bearer test-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}

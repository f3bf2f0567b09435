//! Remote contract data source
//!
//! The upstream REST API owns the contracts and periods. This module fetches
//! them, forwards validated writes, and assembles the in-memory snapshot the
//! derived views are computed from.

pub mod client;
pub mod snapshot;

pub use client::ApiClient;
pub use snapshot::{load_snapshot, Snapshot, SnapshotRefresher, SnapshotStore};

use crate::auth::Session;
use crate::models::{ContractPayload, ContractRecord, PeriodPayload, PeriodRecord, RecordId};
use std::future::Future;

/// Errors from the upstream API layer
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream returned a non-2xx status code.
    #[error("Upstream API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl SourceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Request(e) => e.status().map(|s| s.as_u16()),
            SourceError::Api { status, .. } => Some(*status),
        }
    }
}

/// Contract storage backend. Every call carries the session it acts for.
pub trait ContractSource: Send + Sync {
    fn list_contracts(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<ContractRecord>, SourceError>> + Send;

    fn list_periods(
        &self,
        session: &Session,
        contract_id: &RecordId,
    ) -> impl Future<Output = Result<Vec<PeriodRecord>, SourceError>> + Send;

    fn create_contract(
        &self,
        session: &Session,
        payload: &ContractPayload,
    ) -> impl Future<Output = Result<ContractRecord, SourceError>> + Send;

    fn update_contract(
        &self,
        session: &Session,
        id: &RecordId,
        payload: &ContractPayload,
    ) -> impl Future<Output = Result<ContractRecord, SourceError>> + Send;

    fn create_period(
        &self,
        session: &Session,
        payload: &PeriodPayload,
    ) -> impl Future<Output = Result<PeriodRecord, SourceError>> + Send;

    fn update_period(
        &self,
        session: &Session,
        id: &RecordId,
        payload: &PeriodPayload,
    ) -> impl Future<Output = Result<PeriodRecord, SourceError>> + Send;

    fn delete_period(
        &self,
        session: &Session,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;
}

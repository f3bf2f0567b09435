//! Snapshot assembly: one contract listing plus a per-contract period fan-out

use super::{ContractSource, SourceError};
use crate::auth::Session;
use crate::models::{Contract, Period};
use crate::scheduler::RefreshListener;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the derived views need, fetched in one pass
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub contracts: Vec<Contract>,
    pub periods: Vec<Period>,
    pub fetched_at: DateTime<Utc>,
    /// Contracts whose period request failed and were treated as having none
    pub failed_period_fetches: usize,
}

/// Fetch contracts, then every contract's periods in parallel.
///
/// The period requests are joined all-settled: one failure degrades to an
/// empty list for that contract and never aborts the batch. Only a failed
/// contract listing is an error.
pub async fn load_snapshot<S: ContractSource>(
    source: &S,
    session: &Session,
    fetched_at: DateTime<Utc>,
) -> Result<Snapshot, SourceError> {
    let contracts: Vec<Contract> = source
        .list_contracts(session)
        .await?
        .into_iter()
        .map(Contract::from)
        .collect();

    let fetches = contracts
        .iter()
        .filter(|contract| {
            if contract.id.is_empty() {
                tracing::warn!(
                    "Skipping period fetch for contract without id ({:?})",
                    contract.contract_no
                );
            }
            !contract.id.is_empty()
        })
        .map(|contract| async move {
            (
                &contract.id,
                source.list_periods(session, &contract.id).await,
            )
        });

    let mut periods = Vec::new();
    let mut failed_period_fetches = 0;
    for (contract_id, result) in join_all(fetches).await {
        match result {
            Ok(records) => periods.extend(records.into_iter().map(|record| {
                let mut period = Period::from(record);
                if period.contract_id.is_empty() {
                    period.contract_id = contract_id.clone();
                }
                period
            })),
            Err(e) => {
                failed_period_fetches += 1;
                tracing::warn!(
                    "Failed to fetch periods for contract {}, treating as empty: {}",
                    contract_id,
                    e
                );
            }
        }
    }

    Ok(Snapshot {
        contracts,
        periods,
        fetched_at,
        failed_period_fetches,
    })
}

/// Latest complete snapshot, shared by all handlers
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, snapshot: Snapshot) {
        *self.inner.write().await = Some(Arc::new(snapshot));
    }
}

/// Production refresh listener: reloads the snapshot on every tick and focus.
pub struct SnapshotRefresher<S> {
    source: S,
    session: Session,
    store: SnapshotStore,
}

impl<S: ContractSource> SnapshotRefresher<S> {
    pub fn new(source: S, session: Session, store: SnapshotStore) -> Self {
        Self {
            source,
            session,
            store,
        }
    }

    /// Reload and swap; a failed reload keeps the previous snapshot.
    pub async fn refresh(&self, trigger: &str) {
        match load_snapshot(&self.source, &self.session, Utc::now()).await {
            Ok(snapshot) => {
                tracing::info!(
                    "Snapshot refreshed on {} ({} contracts, {} periods, {} failed period fetches)",
                    trigger,
                    snapshot.contracts.len(),
                    snapshot.periods.len(),
                    snapshot.failed_period_fetches
                );
                self.store.replace(snapshot).await;
            }
            Err(e) => {
                tracing::warn!("Snapshot refresh on {} failed, keeping previous: {}", trigger, e);
            }
        }
    }
}

impl<S: ContractSource + 'static> RefreshListener for SnapshotRefresher<S> {
    async fn on_tick(&self) {
        self.refresh("tick").await;
    }

    async fn on_focus(&self) {
        self.refresh("focus").await;
    }
}

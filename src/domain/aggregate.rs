//! Joins contracts with their periods and computes dashboard counts

use super::deadline::{classify, Classification, Notice};
use crate::models::{Contract, ContractStatus, Period, PeriodStatus, RecordId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Title used when a period points at a contract we do not have
pub const UNSPECIFIED_CONTRACT: &str = "Unspecified contract";

type TitleAccessor = fn(&Contract) -> Option<String>;

/// Fields tried, in order, when resolving a contract's display title.
/// The synthesized `Contract #<id>` entry always succeeds for a known contract.
pub const TITLE_FALLBACKS: &[TitleAccessor] = &[
    by_contact_name,
    by_title,
    by_name,
    by_contract_no,
    by_placeholder,
];

fn by_contact_name(c: &Contract) -> Option<String> {
    c.contact_name.clone()
}

fn by_title(c: &Contract) -> Option<String> {
    c.title.clone()
}

fn by_name(c: &Contract) -> Option<String> {
    c.name.clone()
}

fn by_contract_no(c: &Contract) -> Option<String> {
    c.contract_no.clone()
}

fn by_placeholder(c: &Contract) -> Option<String> {
    Some(format!("Contract #{}", c.id))
}

/// Display title for a contract, or the sentinel when it is missing.
pub fn contract_title(contract: Option<&Contract>) -> String {
    let Some(contract) = contract else {
        return UNSPECIFIED_CONTRACT.to_string();
    };
    TITLE_FALLBACKS
        .iter()
        .filter_map(|accessor| accessor(contract))
        .find(|title| !title.trim().is_empty())
        .unwrap_or_else(|| UNSPECIFIED_CONTRACT.to_string())
}

// =============================================================================
// Output types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedPeriod {
    #[serde(flatten)]
    pub period: Period,
    pub contract_title: String,
    pub contract_no: Option<String>,
    pub department: Option<String>,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_contracts: usize,
    pub total_periods: usize,
    pub contracts_by_status: BTreeMap<ContractStatus, usize>,
    pub periods_by_status: BTreeMap<PeriodStatus, usize>,
    pub upcoming: usize,
    pub overdue: usize,
    pub orphan_periods: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub periods: Vec<EnrichedPeriod>,
    pub summary: Summary,
}

/// One line of the contract list view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractRow<'a> {
    #[serde(flatten)]
    pub contract: &'a Contract,
    /// Resolved through [`TITLE_FALLBACKS`]; the stored `title` stays as is
    pub display_title: String,
    pub display_status: ContractStatus,
    pub period_count: usize,
    pub open_notices: usize,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Index contracts by id; the first occurrence of a duplicated id wins.
fn index_contracts(contracts: &[Contract]) -> HashMap<&RecordId, &Contract> {
    let mut index = HashMap::with_capacity(contracts.len());
    for contract in contracts {
        index.entry(&contract.id).or_insert(contract);
    }
    index
}

pub fn aggregate(contracts: &[Contract], periods: &[Period], now: DateTime<Utc>) -> Aggregation {
    let index = index_contracts(contracts);
    let mut summary = Summary {
        total_contracts: contracts.len(),
        total_periods: periods.len(),
        ..Default::default()
    };

    for contract in contracts {
        *summary
            .contracts_by_status
            .entry(contract.display_status(now))
            .or_default() += 1;
    }

    let enriched = periods
        .iter()
        .map(|period| {
            let parent = index.get(&period.contract_id).copied();
            if parent.is_none() {
                summary.orphan_periods += 1;
            }

            let classification = classify(period, now);
            match classification.notice {
                Notice::Upcoming => summary.upcoming += 1,
                Notice::Overdue => summary.overdue += 1,
                Notice::None => {}
            }
            *summary.periods_by_status.entry(period.status).or_default() += 1;

            EnrichedPeriod {
                period: period.clone(),
                contract_title: contract_title(parent),
                contract_no: parent.and_then(|c| c.contract_no.clone()),
                department: parent.and_then(|c| c.department.clone()),
                classification,
            }
        })
        .collect();

    Aggregation {
        periods: enriched,
        summary,
    }
}

/// Build list rows for an already filtered set of contracts.
pub fn contract_rows<'a>(
    contracts: &[&'a Contract],
    periods: &[Period],
    now: DateTime<Utc>,
) -> Vec<ContractRow<'a>> {
    let mut counts: HashMap<&RecordId, (usize, usize)> = HashMap::new();
    for period in periods {
        let entry = counts.entry(&period.contract_id).or_default();
        entry.0 += 1;
        if classify(period, now).is_notice() {
            entry.1 += 1;
        }
    }

    contracts
        .iter()
        .map(|&contract| {
            let (period_count, open_notices) =
                counts.get(&contract.id).copied().unwrap_or_default();
            ContractRow {
                contract,
                display_title: contract_title(Some(contract)),
                display_status: contract.display_status(now),
                period_count,
                open_notices,
            }
        })
        .collect()
}

/// Upcoming and overdue periods, overdue first, then by due date.
pub fn notifications(aggregation: &Aggregation) -> Vec<&EnrichedPeriod> {
    let mut notices: Vec<&EnrichedPeriod> = aggregation
        .periods
        .iter()
        .filter(|p| p.classification.is_notice())
        .collect();
    // Stable sort keeps input order for equal keys.
    notices.sort_by_key(|p| {
        (
            p.classification.notice != Notice::Overdue,
            p.period.due_date,
        )
    });
    notices
}

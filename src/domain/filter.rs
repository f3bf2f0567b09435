//! Declarative filtering and sorting over in-memory collections
//!
//! The same functions back the contract list, the dashboard and the reports,
//! so every view agrees on what a filter means. Nothing here mutates its input.

use super::aggregate::{ContractRow, EnrichedPeriod};
use super::deadline::Notice;
use crate::models::{Contract, ContractStatus, PeriodStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::cmp::Reverse;
use thiserror::Error;

// =============================================================================
// Filter specifications
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractFilter {
    pub contract_number: Option<String>,
    pub contact_name: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "optional_date")]
    pub start_date_from: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub start_date_to: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub end_date_from: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub end_date_to: Option<NaiveDate>,
    pub remark1: Option<String>,
    pub remark2: Option<String>,
    pub remark3: Option<String>,
    pub remark4: Option<String>,
}

/// Report-view filter over enriched periods
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeriodFilter {
    /// A period status, `open`, or `all`
    pub status: Option<String>,
    pub contract_number: Option<String>,
    #[serde(deserialize_with = "optional_date")]
    pub due_date_from: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub due_date_to: Option<NaiveDate>,
    /// `upcoming`, `overdue`, `none`, `any` (either notice), or `all`
    pub notice: Option<String>,
}

// Query strings send empty values for untouched form fields.
fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A filter value that constrains nothing
fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn contains_folded(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn within(date: Option<DateTime<Utc>>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(day) = date.map(|d| d.date_naive()) else {
        return false;
    };
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

// =============================================================================
// Contracts
// =============================================================================

impl ContractFilter {
    pub fn matches(&self, contract: &Contract, now: DateTime<Utc>) -> bool {
        if let Some(number) = active(&self.contract_number) {
            if !contains_folded(contract.contract_no.as_deref(), number) {
                return false;
            }
        }
        if let Some(name) = active(&self.contact_name) {
            if !contains_folded(contract.contact_name.as_deref(), name) {
                return false;
            }
        }
        if let Some(department) = active(&self.department) {
            if contract.department.as_deref() != Some(department) {
                return false;
            }
        }
        if let Some(status) = active(&self.status) {
            if !status_matches(contract, status, now) {
                return false;
            }
        }
        if !within(contract.start_date, self.start_date_from, self.start_date_to)
            || !within(contract.end_date, self.end_date_from, self.end_date_to)
        {
            return false;
        }

        // Every remark term is searched across all four remark fields.
        [&self.remark1, &self.remark2, &self.remark3, &self.remark4]
            .into_iter()
            .filter_map(active)
            .all(|term| contract.remarks().any(|r| contains_folded(Some(r), term)))
    }
}

/// Matches on the displayed status, so `EXPIRED` covers a stored EXPIRED
/// status or a past end date and the other codes skip past-end contracts.
fn status_matches(contract: &Contract, wanted: &str, now: DateTime<Utc>) -> bool {
    ContractStatus::parse(wanted).is_some_and(|status| contract.display_status(now) == status)
}

/// Contracts matching `filter`, in their original order.
pub fn filter_contracts<'a>(
    contracts: &'a [Contract],
    filter: &ContractFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Contract> {
    contracts
        .iter()
        .filter(|c| filter.matches(c, now))
        .collect()
}

// =============================================================================
// Periods
// =============================================================================

impl PeriodFilter {
    pub fn matches(&self, period: &EnrichedPeriod) -> bool {
        if let Some(status) = active(&self.status) {
            let ok = if status.eq_ignore_ascii_case("open") {
                period.period.status.is_open()
            } else {
                PeriodStatus::parse(status) == Some(period.period.status)
            };
            if !ok {
                return false;
            }
        }
        if let Some(number) = active(&self.contract_number) {
            if !contains_folded(period.contract_no.as_deref(), number) {
                return false;
            }
        }
        if !within(period.period.due_date, self.due_date_from, self.due_date_to) {
            return false;
        }
        match active(&self.notice).map(str::to_lowercase).as_deref() {
            None => true,
            Some("any") => period.classification.is_notice(),
            Some("upcoming") => period.classification.notice == Notice::Upcoming,
            Some("overdue") => period.classification.notice == Notice::Overdue,
            Some("none") => period.classification.notice == Notice::None,
            Some(_) => false,
        }
    }
}

pub fn filter_periods<'a>(
    periods: &'a [EnrichedPeriod],
    filter: &PeriodFilter,
) -> Vec<&'a EnrichedPeriod> {
    periods.iter().filter(|p| filter.matches(p)).collect()
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Text(String),
    Number(i64),
    Date(Option<DateTime<Utc>>),
}

impl SortValue {
    /// Case-folded text; missing text sorts as the empty string.
    pub fn text(value: Option<&str>) -> Self {
        SortValue::Text(value.unwrap_or_default().to_lowercase())
    }

    pub fn number(value: impl TryInto<i64>) -> Self {
        SortValue::Number(value.try_into().unwrap_or(i64::MAX))
    }
}

pub trait Sortable {
    const SORT_FIELDS: &'static [&'static str];

    /// Value for one of `SORT_FIELDS`
    fn sort_value(&self, field: &str) -> SortValue;
}

impl<T: Sortable + ?Sized> Sortable for &T {
    const SORT_FIELDS: &'static [&'static str] = T::SORT_FIELDS;

    fn sort_value(&self, field: &str) -> SortValue {
        (**self).sort_value(field)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: Direction,
}

/// `?sort=<field>&order=asc|desc`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SortQuery {
    pub sort: Option<String>,
    pub order: Option<Direction>,
}

impl SortQuery {
    pub fn spec(&self) -> Option<SortSpec> {
        let field = self.sort.as_deref().map(str::trim).filter(|f| !f.is_empty())?;
        Some(SortSpec {
            field: field.to_string(),
            direction: self.order.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Error)]
pub enum SortError {
    #[error("Unknown sort field '{0}'")]
    UnknownField(String),
}

/// Stable sort; equal keys keep their filtered order in both directions.
pub fn sort_records<T: Sortable>(items: &mut [T], spec: &SortSpec) -> Result<(), SortError> {
    let field = spec.field.as_str();
    if !T::SORT_FIELDS.contains(&field) {
        return Err(SortError::UnknownField(spec.field.clone()));
    }
    match spec.direction {
        Direction::Asc => items.sort_by_cached_key(|item| item.sort_value(field)),
        Direction::Desc => items.sort_by_cached_key(|item| Reverse(item.sort_value(field))),
    }
    Ok(())
}

impl Sortable for Contract {
    const SORT_FIELDS: &'static [&'static str] = &[
        "contract_no",
        "contact_name",
        "department",
        "status",
        "start_date",
        "end_date",
        "created_at",
    ];

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "contract_no" => SortValue::text(self.contract_no.as_deref()),
            "contact_name" => SortValue::text(self.contact_name.as_deref()),
            "department" => SortValue::text(self.department.as_deref()),
            "status" => SortValue::text(Some(self.status.code())),
            "start_date" => SortValue::Date(self.start_date),
            "end_date" => SortValue::Date(self.end_date),
            "created_at" => SortValue::Date(self.created_at),
            _ => SortValue::text(None),
        }
    }
}

impl Sortable for ContractRow<'_> {
    const SORT_FIELDS: &'static [&'static str] = &[
        "contract_no",
        "contact_name",
        "department",
        "status",
        "start_date",
        "end_date",
        "created_at",
        "display_title",
        "period_count",
        "open_notices",
    ];

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "display_title" => SortValue::text(Some(&self.display_title)),
            "status" => SortValue::text(Some(self.display_status.code())),
            "period_count" => SortValue::number(self.period_count),
            "open_notices" => SortValue::number(self.open_notices),
            other => self.contract.sort_value(other),
        }
    }
}

impl Sortable for EnrichedPeriod {
    const SORT_FIELDS: &'static [&'static str] = &[
        "period_no",
        "contract_no",
        "contract_title",
        "due_date",
        "alert_days",
        "status",
        "days_until",
    ];

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "period_no" => SortValue::text(Some(&self.period.period_no)),
            "contract_no" => SortValue::text(self.contract_no.as_deref()),
            "contract_title" => SortValue::text(Some(&self.contract_title)),
            "due_date" => SortValue::Date(self.period.due_date),
            "alert_days" => SortValue::number(self.period.alert_days),
            "status" => SortValue::text(Some(self.period.status.label())),
            "days_until" => SortValue::Number(self.classification.days_until.unwrap_or(0)),
            _ => SortValue::text(None),
        }
    }
}

//! Data models for the application

mod status;

pub use status::{ContractStatus, PeriodStatus};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// =============================================================================
// Identifiers and wire helpers
// =============================================================================

/// Upstream record id. The API sends either numbers or strings; both are kept
/// in string form so `1` and `"1"` refer to the same record.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(RecordId::new(Text::deserialize(deserializer)?.0))
    }
}

/// Scalar that may arrive as a JSON string or number
struct Text(String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Int(i64),
            Float(f64),
            Bool(bool),
        }

        Ok(Text(match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s,
            Raw::Int(n) => n.to_string(),
            Raw::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            Raw::Float(f) => f.to_string(),
            Raw::Bool(b) => b.to_string(),
        }))
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Text>::deserialize(deserializer)?.map(|t| t.0))
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    // Form fields sometimes post numbers as strings ("7").
    Ok(Option::<Text>::deserialize(deserializer)?
        .and_then(|t| t.0.trim().parse::<f64>().ok())
        .map(|f| f.floor() as i64))
}

/// Trim and drop empty strings
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339, naive date-times (read as UTC) and plain dates (UTC
/// midnight). Anything else is treated as absent.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn parse_opt_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

// =============================================================================
// Contract
// =============================================================================

/// Contract as returned by the upstream API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractRecord {
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "lenient_text")]
    pub contract_no: Option<String>,
    pub contact_name: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub department: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub remark1: Option<String>,
    pub remark2: Option<String>,
    pub remark3: Option<String>,
    pub remark4: Option<String>,
    pub alert_emails: Option<String>,
    pub created_at: Option<String>,
}

/// Contract after ingestion: canonical status, parsed dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub id: RecordId,
    pub contract_no: Option<String>,
    pub contact_name: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub status: ContractStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub remarks: [Option<String>; 4],
    pub alert_emails: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ContractRecord> for Contract {
    fn from(record: ContractRecord) -> Self {
        let status = match clean_text(record.status) {
            Some(raw) => {
                let status = ContractStatus::normalize(&raw);
                if status == ContractStatus::Unknown {
                    tracing::warn!("Unrecognized contract status {:?}", raw);
                }
                status
            }
            None => ContractStatus::Created,
        };

        Self {
            id: record.id.unwrap_or_default(),
            contract_no: clean_text(record.contract_no),
            contact_name: clean_text(record.contact_name),
            title: clean_text(record.title),
            name: clean_text(record.name),
            department: clean_text(record.department),
            status,
            start_date: parse_opt_timestamp(record.start_date.as_deref()),
            end_date: parse_opt_timestamp(record.end_date.as_deref()),
            remarks: [
                clean_text(record.remark1),
                clean_text(record.remark2),
                clean_text(record.remark3),
                clean_text(record.remark4),
            ],
            alert_emails: split_emails(record.alert_emails.as_deref().unwrap_or("")),
            created_at: parse_opt_timestamp(record.created_at.as_deref()),
        }
    }
}

impl Contract {
    /// True when the end date lies strictly before `now`.
    pub fn is_past_end(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end < now)
    }

    /// Status shown to users. A past end date reads as expired whatever the
    /// stored status is, so this agrees with the `EXPIRED` filter.
    pub fn display_status(&self, now: DateTime<Utc>) -> ContractStatus {
        if self.is_past_end(now) {
            ContractStatus::Expired
        } else {
            self.status
        }
    }

    /// Edit permission follows the stored status only.
    pub fn permits_edit(&self) -> bool {
        !self.status.is_read_only()
    }

    pub fn remarks(&self) -> impl Iterator<Item = &str> {
        self.remarks.iter().filter_map(|r| r.as_deref())
    }
}

/// Split a comma-separated e-mail list
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Period
// =============================================================================

/// Delivery period as returned by the upstream API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodRecord {
    pub id: Option<RecordId>,
    pub contract_id: Option<RecordId>,
    #[serde(deserialize_with = "lenient_text")]
    pub period_no: Option<String>,
    pub due_date: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub alert_days: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub id: RecordId,
    pub contract_id: RecordId,
    pub period_no: String,
    pub due_date: Option<DateTime<Utc>>,
    /// Days before the due date at which notices start; 0 means none in advance
    pub alert_days: u32,
    pub status: PeriodStatus,
}

impl From<PeriodRecord> for Period {
    fn from(record: PeriodRecord) -> Self {
        let status = PeriodStatus::normalize(record.status.as_deref());
        if status == PeriodStatus::Unknown {
            tracing::warn!("Unrecognized period status {:?}", record.status);
        }

        Self {
            id: record.id.unwrap_or_default(),
            contract_id: record.contract_id.unwrap_or_default(),
            period_no: clean_text(record.period_no).unwrap_or_default(),
            due_date: parse_opt_timestamp(record.due_date.as_deref()),
            alert_days: record
                .alert_days
                .map(|d| d.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(0),
            status,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Contract create/edit form as posted by the SPA
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractInput {
    #[serde(deserialize_with = "lenient_text")]
    pub contract_no: Option<String>,
    pub contact_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub department: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub remark1: Option<String>,
    pub remark2: Option<String>,
    pub remark3: Option<String>,
    pub remark4: Option<String>,
    pub alert_emails: Option<String>,
}

/// Period create/edit form, scoped to one contract
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeriodInput {
    #[serde(deserialize_with = "lenient_text")]
    pub period_no: Option<String>,
    pub due_date: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub alert_days: Option<i64>,
    pub status: Option<String>,
}

/// Validated contract body sent upstream (full replace of editable fields)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractPayload {
    pub contract_no: String,
    pub contact_name: Option<String>,
    pub department: Option<String>,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub remark1: Option<String>,
    pub remark2: Option<String>,
    pub remark3: Option<String>,
    pub remark4: Option<String>,
    pub alert_emails: String,
}

impl ContractPayload {
    /// Re-emit a stored contract with a new status.
    pub fn with_status(contract: &Contract, status: ContractStatus) -> Self {
        let [remark1, remark2, remark3, remark4] = contract.remarks.clone();
        Self {
            contract_no: contract.contract_no.clone().unwrap_or_default(),
            contact_name: contract.contact_name.clone(),
            department: contract.department.clone(),
            status: status.code().to_string(),
            start_date: contract.start_date.map(|d| format_date(&d)),
            end_date: contract.end_date.map(|d| format_date(&d)),
            remark1,
            remark2,
            remark3,
            remark4,
            alert_emails: contract.alert_emails.join(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPayload {
    pub contract_id: RecordId,
    pub period_no: String,
    pub due_date: String,
    pub alert_days: u32,
    pub status: String,
}

/// Calendar date in the form the upstream API stores
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

// =============================================================================
// API Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

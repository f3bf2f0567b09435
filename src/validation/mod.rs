//! Input validation module

use crate::models::{
    clean_text, format_date, parse_timestamp, split_emails, ContractInput, ContractPayload,
    ContractStatus, PeriodInput, PeriodPayload, PeriodStatus, RecordId,
};
use thiserror::Error;

const MAX_CONTRACT_NO: usize = 100;
const MAX_NAME: usize = 255;
const MAX_REMARK: usize = 1000;
const MAX_ALERT_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' is too long (max {max} characters)")]
    TooLong { field: String, max: usize },

    #[error("Field '{field}' is not a valid date")]
    InvalidDate { field: String },

    #[error("End date must not be before start date")]
    EndBeforeStart,

    #[error("Invalid email format: {email}")]
    InvalidEmail { email: String },

    #[error("Unknown status: {status}")]
    InvalidStatus { status: String },

    #[error("Alert days must be between 0 and {max}")]
    AlertDaysOutOfRange { max: i64 },
}

fn required(value: &Option<String>, field: &str) -> Result<String, ValidationError> {
    clean_text(value.clone()).ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

fn max_len(value: Option<String>, field: &str, max: usize) -> Result<Option<String>, ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        other => Ok(other),
    }
}

fn optional_date(
    value: &Option<String>,
    field: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, ValidationError> {
    match clean_text(value.clone()) {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidDate {
                field: field.to_string(),
            }),
    }
}

/// Validate a contract form and build the upstream body.
///
/// `current` is the stored status of the contract being edited, kept when the
/// form omits one. New contracts (`None`) default to created.
pub fn validate_contract_input(
    input: &ContractInput,
    current: Option<ContractStatus>,
) -> Result<ContractPayload, ValidationError> {
    let contract_no = required(&input.contract_no, "contract_no")?;
    if contract_no.chars().count() > MAX_CONTRACT_NO {
        return Err(ValidationError::TooLong {
            field: "contract_no".to_string(),
            max: MAX_CONTRACT_NO,
        });
    }

    let contact_name = max_len(clean_text(input.contact_name.clone()), "contact_name", MAX_NAME)?;
    let department = max_len(clean_text(input.department.clone()), "department", MAX_NAME)?;

    let status = match clean_text(input.status.clone()) {
        None => match current {
            None => ContractStatus::Created,
            Some(ContractStatus::Unknown) => {
                return Err(ValidationError::Required {
                    field: "status".to_string(),
                })
            }
            Some(status) => status,
        },
        Some(raw) => match ContractStatus::parse(&raw) {
            Some(ContractStatus::Unknown) | None => {
                return Err(ValidationError::InvalidStatus { status: raw })
            }
            Some(status) => status,
        },
    };

    let start = optional_date(&input.start_date, "start_date")?;
    let end = optional_date(&input.end_date, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if end.date_naive() < start.date_naive() {
            return Err(ValidationError::EndBeforeStart);
        }
    }

    let remark = |value: &Option<String>, field: &str| {
        max_len(clean_text(value.clone()), field, MAX_REMARK)
    };
    let remark1 = remark(&input.remark1, "remark1")?;
    let remark2 = remark(&input.remark2, "remark2")?;
    let remark3 = remark(&input.remark3, "remark3")?;
    let remark4 = remark(&input.remark4, "remark4")?;

    let emails = split_emails(input.alert_emails.as_deref().unwrap_or(""));
    if let Some(bad) = emails.iter().find(|e| !is_valid_email(e)) {
        return Err(ValidationError::InvalidEmail { email: bad.clone() });
    }

    Ok(ContractPayload {
        contract_no,
        contact_name,
        department,
        status: status.code().to_string(),
        start_date: start.as_ref().map(format_date),
        end_date: end.as_ref().map(format_date),
        remark1,
        remark2,
        remark3,
        remark4,
        alert_emails: emails.join(","),
    })
}

/// Validate a period form for the given parent contract
pub fn validate_period_input(
    input: &PeriodInput,
    contract_id: &RecordId,
) -> Result<PeriodPayload, ValidationError> {
    let period_no = required(&input.period_no, "period_no")?;
    if period_no.chars().count() > MAX_CONTRACT_NO {
        return Err(ValidationError::TooLong {
            field: "period_no".to_string(),
            max: MAX_CONTRACT_NO,
        });
    }

    let due_date = optional_date(&input.due_date, "due_date")?.ok_or_else(|| {
        ValidationError::Required {
            field: "due_date".to_string(),
        }
    })?;

    let alert_days = input.alert_days.unwrap_or(0);
    if !(0..=MAX_ALERT_DAYS).contains(&alert_days) {
        return Err(ValidationError::AlertDaysOutOfRange {
            max: MAX_ALERT_DAYS,
        });
    }

    let status = match clean_text(input.status.clone()) {
        None => PeriodStatus::Pending,
        Some(raw) => PeriodStatus::parse(&raw)
            .ok_or(ValidationError::InvalidStatus { status: raw })?,
    };

    Ok(PeriodPayload {
        contract_id: contract_id.clone(),
        period_no,
        due_date: format_date(&due_date),
        alert_days: alert_days as u32,
        status: status.label().to_string(),
    })
}

fn is_valid_email(email: &str) -> bool {
    validator::validate_email(email)
}

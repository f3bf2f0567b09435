//! Deadline classification for delivery periods

use crate::models::Period;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    None,
    Upcoming,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Human-facing distance to the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum DeadlineLabel {
    NoDeadline,
    Today,
    Tomorrow,
    InDays(i64),
    OverdueBy(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub notice: Notice,
    pub priority: Priority,
    /// `ceil((due - now) / 1 day)`; zero or negative once the due date has passed
    pub days_until: Option<i64>,
    /// `ceil((now - due) / 1 day)` when the due date has passed
    pub days_overdue: Option<i64>,
}

impl Classification {
    const NONE: Classification = Classification {
        notice: Notice::None,
        priority: Priority::Low,
        days_until: None,
        days_overdue: None,
    };

    pub fn is_notice(&self) -> bool {
        self.notice != Notice::None
    }

    pub fn label(&self) -> DeadlineLabel {
        match (self.days_overdue, self.days_until) {
            (Some(days), _) => DeadlineLabel::OverdueBy(days),
            (None, None) => DeadlineLabel::NoDeadline,
            (None, Some(days)) if days <= 0 => DeadlineLabel::Today,
            (None, Some(1)) => DeadlineLabel::Tomorrow,
            (None, Some(days)) => DeadlineLabel::InDays(days),
        }
    }
}

/// Whole days from `now` until `due`, rounded up on the millisecond difference.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_div((due - now).num_milliseconds(), MS_PER_DAY)
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    -((-value).div_euclid(divisor))
}

/// Classify one period against a caller-supplied instant.
///
/// Callers read the clock once per batch and pass the same `now` to every
/// call so a list is evaluated consistently.
pub fn classify(period: &Period, now: DateTime<Utc>) -> Classification {
    let Some(due) = period.due_date else {
        return Classification::NONE;
    };
    let days = days_until(due, now);
    let overdue = (due < now).then(|| ceil_div((now - due).num_milliseconds(), MS_PER_DAY));
    if !period.status.is_open() {
        return Classification {
            days_until: Some(days),
            days_overdue: overdue,
            ..Classification::NONE
        };
    }

    if overdue.is_some() {
        return Classification {
            notice: Notice::Overdue,
            priority: Priority::High,
            days_until: Some(days),
            days_overdue: overdue,
        };
    }

    // A window reaching past the calendar's range covers every instant.
    let in_window = due
        .checked_sub_signed(Duration::days(i64::from(period.alert_days)))
        .map_or(true, |alert_from| now >= alert_from);
    if in_window {
        Classification {
            notice: Notice::Upcoming,
            priority: if days <= 1 {
                Priority::High
            } else {
                Priority::Medium
            },
            days_until: Some(days),
            days_overdue: None,
        }
    } else {
        Classification {
            days_until: Some(days),
            ..Classification::NONE
        }
    }
}

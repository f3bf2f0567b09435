//! Canonical contract and period statuses
//!
//! The upstream API stores statuses as free text, with legacy English codes and
//! Thai labels mixed together. Everything is folded into these closed enums when
//! records are ingested, so the rest of the service only sees canonical variants.

use serde::Serialize;

// =============================================================================
// Contract Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Created,
    Active,
    Completed,
    Cancelled,
    Expired,
    Deleted,
    Unknown,
}

impl ContractStatus {
    /// Fold a stored or user-supplied status into its canonical variant.
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Unknown)
    }

    /// Recognize a status, returning `None` for text with no known meaning.
    pub fn parse(raw: &str) -> Option<Self> {
        let folded = raw.trim().to_lowercase();
        let status = match folded.as_str() {
            "created" | "new" | "สร้างแล้ว" | "สร้าง" | "ใหม่" => Self::Created,
            "active" | "ใช้งาน" | "ใช้งานอยู่" => Self::Active,
            "completed" | "complete" | "เสร็จสิ้น" => Self::Completed,
            "cancelled" | "canceled" | "ยกเลิก" => Self::Cancelled,
            "expired" | "expire" | "หมดอายุ" => Self::Expired,
            "deleted" | "delete" | "ลบแล้ว" | "ลบ" => Self::Deleted,
            "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(status)
    }

    /// Canonical upstream code
    pub fn code(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Deleted => "DELETED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Thai display label used in exports and printouts
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "สร้างแล้ว",
            Self::Active => "ใช้งาน",
            Self::Completed => "เสร็จสิ้น",
            Self::Cancelled => "ยกเลิก",
            Self::Expired => "หมดอายุ",
            Self::Deleted => "ลบแล้ว",
            Self::Unknown => "ไม่ทราบสถานะ",
        }
    }

    /// Stored statuses that lock a contract against edits.
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Deleted | Self::Cancelled)
    }
}

// =============================================================================
// Period Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Pending,
    InProgress,
    Done,
    Unknown,
}

impl PeriodStatus {
    /// Fold a stored status; an absent status is the form default, pending.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Pending,
            Some(text) => Self::parse(text).unwrap_or(Self::Unknown),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let folded = raw.trim().to_lowercase();
        let status = match folded.as_str() {
            "รอดำเนินการ" | "pending" | "waiting" => Self::Pending,
            "กำลังดำเนินการ" | "in_progress" | "in-progress" | "in progress" => Self::InProgress,
            "เสร็จสิ้น" | "completed" | "complete" | "done" => Self::Done,
            _ => return None,
        };
        Some(status)
    }

    /// Open periods are the only ones that raise deadline notices.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Value written back to the upstream API
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "รอดำเนินการ",
            Self::InProgress => "กำลังดำเนินการ",
            Self::Done => "เสร็จสิ้น",
            Self::Unknown => "ไม่ทราบสถานะ",
        }
    }
}

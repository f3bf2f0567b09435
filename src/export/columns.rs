use super::Table;
use crate::domain::aggregate::{ContractRow, EnrichedPeriod};
use crate::domain::deadline::DeadlineLabel;
use crate::domain::Notice;
use crate::models::format_date;
use chrono::{DateTime, Utc};

const CONTRACT_HEADERS: [&str; 11] = [
    "เลขที่สัญญา",
    "ชื่อสัญญา",
    "หน่วยงาน",
    "สถานะ",
    "วันเริ่มต้น",
    "วันสิ้นสุด",
    "หมายเหตุ 1",
    "หมายเหตุ 2",
    "หมายเหตุ 3",
    "หมายเหตุ 4",
    "อีเมลแจ้งเตือน",
];

const PERIOD_HEADERS: [&str; 8] = [
    "เลขที่สัญญา",
    "ชื่อสัญญา",
    "งวดที่",
    "วันครบกำหนด",
    "แจ้งเตือนล่วงหน้า (วัน)",
    "สถานะ",
    "การแจ้งเตือน",
    "ระยะเวลา",
];

fn date_cell(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| format_date(&d)).unwrap_or_default()
}

fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn notice_text(notice: Notice) -> &'static str {
    match notice {
        Notice::None => "",
        Notice::Upcoming => "ใกล้ครบกำหนด",
        Notice::Overdue => "เกินกำหนด",
    }
}

/// Thai wording for the distance to a due date
fn deadline_text(label: DeadlineLabel) -> String {
    match label {
        DeadlineLabel::NoDeadline => "-".to_string(),
        DeadlineLabel::Today => "วันนี้".to_string(),
        DeadlineLabel::Tomorrow => "พรุ่งนี้".to_string(),
        DeadlineLabel::InDays(days) => format!("อีก {} วัน", days),
        DeadlineLabel::OverdueBy(days) => format!("เกินกำหนด {} วัน", days),
    }
}

pub fn contract_table(rows: &[ContractRow<'_>]) -> Table {
    let rows = rows
        .iter()
        .map(|row| {
            let c = row.contract;
            let mut cells = vec![
                text_cell(c.contract_no.as_deref()),
                row.display_title.clone(),
                text_cell(c.department.as_deref()),
                row.display_status.label().to_string(),
                date_cell(c.start_date),
                date_cell(c.end_date),
            ];
            cells.extend(c.remarks.iter().map(|r| text_cell(r.as_deref())));
            cells.push(c.alert_emails.join(", "));
            cells
        })
        .collect();

    Table {
        title: "รายงานสัญญา".to_string(),
        headers: CONTRACT_HEADERS.to_vec(),
        rows,
    }
}

pub fn period_table(periods: &[&EnrichedPeriod]) -> Table {
    let rows = periods
        .iter()
        .map(|p| {
            vec![
                text_cell(p.contract_no.as_deref()),
                p.contract_title.clone(),
                p.period.period_no.clone(),
                date_cell(p.period.due_date),
                p.period.alert_days.to_string(),
                p.period.status.label().to_string(),
                notice_text(p.classification.notice).to_string(),
                deadline_text(p.classification.label()),
            ]
        })
        .collect();

    Table {
        title: "รายงานงวดงาน".to_string(),
        headers: PERIOD_HEADERS.to_vec(),
        rows,
    }
}

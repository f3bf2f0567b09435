use super::Table;
use chrono::{DateTime, Utc};
use std::fmt::Write;

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PRINT_STYLE: &str = "body{font-family:sans-serif;margin:24px}\
table{border-collapse:collapse;width:100%;font-size:12px}\
th,td{border:1px solid #999;padding:4px 6px;text-align:left;vertical-align:top}\
th{background:#eee}\
@media print{body{margin:0}}";

/// Self-contained printable page for a table. Every cell is escaped.
pub fn to_html(table: &Table, generated_at: DateTime<Utc>) -> String {
    let title = html_escape(&table.title);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"th\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{PRINT_STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n<p>{}</p>\n<table>\n<thead><tr>",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
    );
    for header in &table.headers {
        let _ = write!(out, "<th>{}</th>", html_escape(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", html_escape(cell));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

use super::{ExportError, Table};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Byte-order mark so spreadsheet applications detect UTF-8 (Thai text)
const UTF8_BOM: &str = "\u{FEFF}";

/// Render a table as CSV: every field quoted, `\n` line endings, BOM prefix.
pub fn to_csv(table: &Table) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(format!("{}{}", UTF8_BOM, String::from_utf8(bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table {
            title: "t".to_string(),
            headers: vec!["a", "b"],
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    #[test]
    fn test_csv_has_bom_and_quotes_everything() {
        let csv = to_csv(&table(vec![vec!["1", "สัญญา"]])).unwrap();
        assert!(csv.starts_with('\u{FEFF}'));
        assert_eq!(&csv[UTF8_BOM.len()..], "\"a\",\"b\"\n\"1\",\"สัญญา\"\n");
    }

    #[test]
    fn test_csv_escapes_quotes_commas_and_newlines() {
        let csv = to_csv(&table(vec![vec!["say \"hi\"", "x,y\nz"]])).unwrap();
        assert!(csv.ends_with("\"say \"\"hi\"\"\",\"x,y\nz\"\n"));
    }

    #[test]
    fn test_csv_empty_table_keeps_header() {
        let csv = to_csv(&table(vec![])).unwrap();
        assert_eq!(&csv[UTF8_BOM.len()..], "\"a\",\"b\"\n");
    }
}

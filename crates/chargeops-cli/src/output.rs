//! Terminal rendering of pages, records and statistics

use chargeops_core::Record;
use chargeops_core::utils::format_amount;
use chargeops_view::PageInfo;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

/// Widest a table cell may grow before it is truncated
const MAX_CELL_WIDTH: usize = 32;

/// Columns holding money
const AMOUNT_COLUMNS: &[&str] = &["amount"];

/// Render rows as an aligned table over `columns`
pub fn render_table(columns: &[&str], rows: &[&Record]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| truncate(&cell(row, column)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|c| (*c).to_string()), &widths);
    push_line(&mut out, widths.iter().map(|w| "-".repeat(*w)), &widths);
    for row in cells {
        push_line(&mut out, row.into_iter(), &widths);
    }
    out
}

fn cell(row: &Record, column: &str) -> String {
    if AMOUNT_COLUMNS.contains(&column)
        && let Some(amount) = row.number(column)
    {
        return format_amount(amount);
    }
    row.get(column).map(ToString::to_string).unwrap_or_default()
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}

/// "Showing X-Y of N" line under a table
pub fn page_footer(info: &PageInfo) -> String {
    if info.total == 0 {
        return "No records found".to_string();
    }
    format!(
        "Showing {}-{} of {} (page {}/{})",
        info.first_item, info.last_item, info.total, info.page, info.total_pages
    )
}

/// One record as `field: value` lines
pub fn render_record(record: &Record) -> String {
    let width = record.fields().map(|(k, _)| k.chars().count()).max().unwrap_or_default();
    record.fields().fold(String::new(), |mut out, (field, value)| {
        let _ = writeln!(out, "{field:<width$}  {value}");
        out
    })
}

/// A statistics struct as `label: value` lines under a heading
///
/// # Errors
///
/// Returns an error if `stats` does not serialize to an object.
pub fn render_stats<T: Serialize>(heading: &str, stats: &T) -> anyhow::Result<String> {
    let Value::Object(fields) = serde_json::to_value(stats)? else {
        anyhow::bail!("statistics for {heading} are not an object");
    };

    let mut out = format!("{heading}\n");
    for (key, value) in fields {
        let label = key.replace('_', " ");
        let _ = writeln!(out, "  {label:<16} {}", display_json(&value));
    }
    Ok(out)
}

fn display_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Pretty-print any serializable value as JSON
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chargeops_view::Paginator;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_aligns_columns() {
        let a = Record::new().with("id", 1).with("name", "Tesla Supercharger A");
        let b = Record::new().with("id", 22).with("name", "Ionity");
        let table = render_table(&["id", "name"], &[&a, &b]);

        assert_eq!(
            table,
            "id  name\n--  --------------------\n1   Tesla Supercharger A\n22  Ionity\n"
        );
    }

    #[test]
    fn test_amounts_are_formatted_as_money() {
        let a = Record::new().with("id", 1).with("amount", 25.5);
        let b = Record::new().with("id", 2).with("amount", "125");
        let c = Record::new().with("id", 3).with("amount", "n/a");
        let table = render_table(&["id", "amount"], &[&a, &b, &c]);

        assert_eq!(
            table,
            "id  amount\n--  -------\n1   $25.50\n2   $125.00\n3   n/a\n"
        );
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let long = "x".repeat(50);
        let row = Record::new().with("comment", long.as_str());
        let table = render_table(&["comment"], &[&row]);
        let last = table.lines().last().unwrap();
        assert_eq!(last.chars().count(), MAX_CELL_WIDTH);
        assert!(last.ends_with('…'));
    }

    #[test]
    fn test_page_footer() {
        let pager = Paginator::new(8);
        assert_eq!(page_footer(&pager.info(17)), "Showing 1-8 of 17 (page 1/3)");
        assert_eq!(page_footer(&pager.info(0)), "No records found");
    }

    #[test]
    fn test_render_stats() {
        #[derive(Serialize)]
        struct Sample {
            total: usize,
            growth_rate: f64,
        }

        let out = render_stats("Users", &Sample { total: 3, growth_rate: 33.3 }).unwrap();
        assert_eq!(out, "Users\n  total            3\n  growth rate      33.3\n");
    }

    #[test]
    fn test_render_record() {
        let record = Record::new().with("id", 7).with("status", "Available");
        assert_eq!(render_record(&record), "id      7\nstatus  Available\n");
    }
}

//! Dry-run rendering of the transformed fact table.

use std::fmt::Write as _;

use crate::{
    data::Value,
    table::{ColumnKind, Table},
};

/// Renders up to `limit` rows as an aligned text table. Numeric columns are
/// right-aligned; missing cells render as blanks.
pub fn render(table: &Table, limit: usize) -> String {
    let headers = table.headers();
    let right_align = (0..headers.len())
        .map(|idx| {
            matches!(
                table.column_kind(idx),
                ColumnKind::Integer | ColumnKind::Decimal
            )
        })
        .collect::<Vec<_>>();
    let rows = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            row.iter()
                .map(|cell| {
                    cell.as_ref()
                        .map(Value::as_display)
                        .map(|text| sanitize_cell(&text))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let separators = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separators, &widths, &[]));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &right_align));
    }
    output
}

fn format_row(values: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            if right_align.get(idx).copied().unwrap_or(false) {
                format!("{value:>width$}")
            } else {
                format!("{value:<width$}")
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn sanitize_cell(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn numeric_columns_align_right() {
        let table = Table::new(
            vec!["band".into(), "margin".into()],
            vec![
                vec![
                    Some(Value::Text("Low (≤20%)".into())),
                    Some(Value::Decimal(Decimal::new(1, 1))),
                ],
                vec![None, Some(Value::Decimal(Decimal::new(-125, 2)))],
            ],
        )
        .unwrap();
        let rendered = render(&table, 10);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "band        margin");
        assert_eq!(lines[1], "----------  ------");
        assert_eq!(lines[2], "Low (≤20%)     0.1");
        assert_eq!(lines[3], "             -1.25");
    }

    #[test]
    fn limit_caps_rendered_rows() {
        let rows = (0..5).map(|i| vec![Some(Value::Integer(i))]).collect();
        let table = Table::new(vec!["n".into()], rows).unwrap();
        assert_eq!(render(&table, 2).lines().count(), 4);
    }
}

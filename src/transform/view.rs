//! Views: project a wide table onto a named selection of columns.

use crate::domain::{ColumnRename, Selection, ViewSpec, WideRow, WideTable};
use crate::error::{ExtractError, ExtractResult};

/// Apply a selection to a wide table.
///
/// Explicit selections fail on the first unknown column. A prefix that matches
/// nothing is not an error: the result is an empty table.
pub fn extract_view(table: &WideTable, selection: &Selection) -> ExtractResult<WideTable> {
    match selection {
        Selection::Explicit { columns } => explicit(table, columns),
        Selection::Prefix { prefix } => Ok(by_prefix(table, prefix)),
    }
}

/// Apply every view, in order. Nothing is returned unless all views succeed.
pub fn extract_views(
    table: &WideTable,
    views: &[ViewSpec],
) -> ExtractResult<Vec<(String, WideTable)>> {
    views
        .iter()
        .map(|v| Ok((v.name.clone(), extract_view(table, &v.selection)?)))
        .collect()
}

fn explicit(table: &WideTable, columns: &[ColumnRename]) -> ExtractResult<WideTable> {
    let indices = columns
        .iter()
        .map(|c| {
            table
                .column_index(&c.column)
                .ok_or_else(|| ExtractError::UnknownColumn(c.column.clone()))
        })
        .collect::<ExtractResult<Vec<usize>>>()?;
    let labels = columns.iter().map(|c| c.label.clone()).collect();
    Ok(project(table, &indices, labels))
}

fn by_prefix(table: &WideTable, prefix: &str) -> WideTable {
    let (indices, labels): (Vec<usize>, Vec<String>) = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(prefix))
        .map(|(i, name)| (i, name.clone()))
        .unzip();

    if indices.is_empty() {
        return WideTable::empty();
    }
    project(table, &indices, labels)
}

fn project(table: &WideTable, indices: &[usize], columns: Vec<String>) -> WideTable {
    let rows = table
        .rows
        .iter()
        .map(|row| WideRow {
            period: row.period.clone(),
            values: indices.iter().map(|&i| row.values[i]).collect(),
        })
        .collect();
    WideTable { columns, rows }
}

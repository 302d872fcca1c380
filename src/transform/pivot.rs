//! Pivot: long-form resolved records -> wide table.
//!
//! Rules:
//! - one row per distinct period, rows sorted ascending (period codes sort as strings)
//! - one column per `subject_measure`, in order of first appearance in the input
//! - at most one value per cell; an identical repeat is ignored, a differing one is an error
//! - combinations that never appear stay absent (`None`), never zero
//! - a column name belongs to exactly one subject/measure pair

use std::collections::{BTreeMap, HashMap};

use crate::domain::{ResolvedRecord, WideRow, WideTable};
use crate::error::{ExtractError, ExtractResult};

pub fn pivot(records: &[ResolvedRecord]) -> ExtractResult<WideTable> {
    let mut columns: Vec<String> = Vec::new();
    let mut column_index: HashMap<String, usize> = HashMap::new();
    // column -> (subject, measure) that produced it
    let mut owners: Vec<(&str, &str)> = Vec::new();
    // period -> (column -> value)
    let mut cells: BTreeMap<&str, HashMap<usize, Option<f64>>> = BTreeMap::new();

    for record in records {
        let name = record.series_name();
        let col = match column_index.get(&name) {
            Some(&col) => {
                let (subject, measure) = owners[col];
                if subject != record.subject || measure != record.measure {
                    return Err(ExtractError::ColumnCollision {
                        column: name,
                        first_subject: subject.to_string(),
                        first_measure: measure.to_string(),
                        second_subject: record.subject.clone(),
                        second_measure: record.measure.clone(),
                    });
                }
                col
            }
            None => {
                let col = columns.len();
                column_index.insert(name.clone(), col);
                columns.push(name);
                owners.push((record.subject.as_str(), record.measure.as_str()));
                col
            }
        };

        let row = cells.entry(record.time_period.as_str()).or_default();
        match row.get(&col) {
            None => {
                row.insert(col, record.value);
            }
            Some(existing) if *existing == record.value => {}
            Some(existing) => {
                return Err(ExtractError::DuplicateObservation {
                    subject: record.subject.clone(),
                    measure: record.measure.clone(),
                    period: record.time_period.clone(),
                    first: *existing,
                    second: record.value,
                });
            }
        }
    }

    let width = columns.len();
    let rows = cells
        .into_iter()
        .map(|(period, row)| {
            let mut values = vec![None; width];
            for (col, value) in row {
                values[col] = value;
            }
            WideRow {
                period: period.to_string(),
                values,
            }
        })
        .collect();

    Ok(WideTable { columns, rows })
}

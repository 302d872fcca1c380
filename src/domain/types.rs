//! Shared domain types.
//!
//! These types are immutable value records: every pipeline stage builds a new
//! value from the previous one instead of editing it in place.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// One decoded value of a dimension axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisEntry {
    /// 0-based rank of the value in the axis' declared ordering.
    pub index: usize,
    pub code: String,
    pub display_name: String,
}

/// An axis of classification (subject, measure, time, ...) with its ordered values.
///
/// `entries[i].index == i` always holds, so positional lookup is a plain slice index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionAxis {
    pub id: String,
    pub name: String,
    pub entries: Vec<AxisEntry>,
}

impl DimensionAxis {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code stored at a positional index.
    pub fn code(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.code.as_str())
    }

    /// Code at `index`, or `IndexOutOfRange` naming this axis.
    pub fn resolve(&self, index: usize) -> ExtractResult<&str> {
        self.code(index).ok_or_else(|| ExtractError::IndexOutOfRange {
            axis: self.id.clone(),
            index,
            len: self.len(),
        })
    }
}

/// Positional key of one observation: one index per declared axis, in axis order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationKey(pub Vec<usize>);

impl ObservationKey {
    pub fn components(&self) -> &[usize] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

/// A single data point before its key is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub key: ObservationKey,
    /// `None` when the payload carries an explicit `null`.
    pub value: Option<f64>,
}

/// An observation with its subject, measure and period decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub subject: String,
    pub measure: String,
    pub time_period: String,
    pub value: Option<f64>,
}

impl ResolvedRecord {
    pub fn new(
        subject: impl Into<String>,
        measure: impl Into<String>,
        time_period: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self {
            subject: subject.into(),
            measure: measure.into(),
            time_period: time_period.into(),
            value,
        }
    }

    /// Column name of the series this record belongs to.
    pub fn series_name(&self) -> String {
        format!("{}_{}", self.subject, self.measure)
    }
}

/// One row of a wide table: a period and one optional value per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub period: String,
    pub values: Vec<Option<f64>>,
}

/// A dense table keyed by period with one column per series.
///
/// Rows are sorted by period ascending. Every row's `values` has exactly
/// `columns.len()` entries; `None` means the cell is absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `(period, column)`, if the cell is populated.
    pub fn value(&self, period: &str, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.rows
            .iter()
            .find(|r| r.period == period)
            .and_then(|r| r.values.get(col).copied().flatten())
    }

    /// All values of one column in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r.values[col]).collect())
    }

    /// Number of populated cells.
    pub fn populated_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_some()).count())
            .sum()
    }

    /// First and last period, if the table has rows.
    pub fn period_range(&self) -> Option<(&str, &str)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.period.as_str(), last.period.as_str()))
    }
}

/// Which key component holds the subject, measure and time indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisPositions {
    pub subject: usize,
    pub measure: usize,
    pub time: usize,
}

impl Default for AxisPositions {
    /// Layout of a `[location, subject, measure, frequency, time]` request.
    fn default() -> Self {
        Self {
            subject: 1,
            measure: 2,
            time: 4,
        }
    }
}

impl AxisPositions {
    /// Check the positions against the declared key arity.
    pub fn validate(&self, arity: usize) -> ExtractResult<()> {
        for (role, pos) in [
            ("subject", self.subject),
            ("measure", self.measure),
            ("time", self.time),
        ] {
            if pos >= arity {
                return Err(ExtractError::AxisPosition(format!(
                    "{role} axis position {pos} is outside a {arity}-axis key"
                )));
            }
        }
        if self.subject == self.measure || self.subject == self.time || self.measure == self.time {
            return Err(ExtractError::AxisPosition(format!(
                "subject/measure/time positions must be distinct (got {}/{}/{})",
                self.subject, self.measure, self.time
            )));
        }
        Ok(())
    }
}

/// Axis ids looked up in the structure section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisIds {
    pub subject: String,
    pub measure: String,
    pub time: String,
}

impl Default for AxisIds {
    fn default() -> Self {
        Self {
            subject: "SUBJECT".to_string(),
            measure: "MEASURE".to_string(),
            time: "TIME_PERIOD".to_string(),
        }
    }
}

/// Per-axis code selectors for a request. An empty list selects every code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisSelectors {
    pub location: Vec<String>,
    pub subject: Vec<String>,
    pub measure: Vec<String>,
    pub frequency: Vec<String>,
}

impl AxisSelectors {
    /// Selector sets in request order: location, subject, measure, frequency.
    pub fn in_request_order(&self) -> Vec<Vec<String>> {
        vec![
            self.location.clone(),
            self.subject.clone(),
            self.measure.clone(),
            self.frequency.clone(),
        ]
    }
}

/// How a view picks its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum Selection {
    /// Exactly these columns, in this order, renamed.
    Explicit { columns: Vec<ColumnRename> },
    /// Every column whose name starts with `prefix`, names kept.
    Prefix { prefix: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub column: String,
    pub label: String,
}

impl ColumnRename {
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
        }
    }
}

/// A named selection; `name` is also the sink name of the resulting table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub name: String,
    pub selection: Selection,
}

impl ViewSpec {
    pub fn explicit(name: impl Into<String>, columns: Vec<ColumnRename>) -> Self {
        Self {
            name: name.into(),
            selection: Selection::Explicit { columns },
        }
    }

    pub fn prefix(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selection: Selection::Prefix {
                prefix: prefix.into(),
            },
        }
    }
}

/// Built-in views for the Main Economic Indicators dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ViewPreset {
    /// Trend/normalised GDP plus CPI.
    GdpCpi,
    /// Total industrial production, seasonally adjusted.
    IndustrialProduction,
}

impl ViewPreset {
    pub fn view(self) -> ViewSpec {
        match self {
            ViewPreset::GdpCpi => ViewSpec::explicit(
                "GDPCPIData",
                vec![
                    ColumnRename::new("LORSGPTD_STSA", "TrendGDP"),
                    ColumnRename::new("LORSGPRT_STSA", "RatioToTrendGDP"),
                    ColumnRename::new("LORSGPNO_STSA", "NormalisedGDP"),
                    ColumnRename::new("CCRETT01_IXOB", "CPI"),
                ],
            ),
            ViewPreset::IndustrialProduction => ViewSpec::explicit(
                "IndustryProduction",
                vec![ColumnRename::new("PRINTO01_IXOBSA", "Total Industry Production")],
            ),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` defaults) and is fixed for the
/// lifetime of a [`crate::app::pipeline::Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub dataset: String,
    pub selectors: AxisSelectors,
    pub start: Option<String>,
    pub end: Option<String>,
    pub axis_ids: AxisIds,
    pub positions: AxisPositions,
    pub key_delimiter: char,
    pub views: Vec<ViewSpec>,
    /// Also persist the full wide table under the name `wide`.
    pub keep_wide: bool,
    /// Root directory for CSV output; one subdirectory per location.
    pub out_dir: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            dataset: "MEI".to_string(),
            selectors: AxisSelectors {
                location: vec!["IND".to_string()],
                frequency: vec!["M".to_string()],
                ..AxisSelectors::default()
            },
            start: None,
            end: None,
            axis_ids: AxisIds::default(),
            positions: AxisPositions::default(),
            key_delimiter: ':',
            views: Vec::new(),
            keep_wide: false,
            out_dir: PathBuf::from("."),
        }
    }
}

impl ExtractConfig {
    /// Reject configurations that can never produce a table.
    ///
    /// Axis positions are checked against the payload arity later, once the
    /// structure section is known; here we only check they are distinct.
    pub fn validate(&self) -> ExtractResult<()> {
        if self.dataset.trim().is_empty() {
            return Err(ExtractError::Config("dataset identifier is empty".to_string()));
        }
        let p = self.positions;
        self.positions
            .validate(p.subject.max(p.measure).max(p.time) + 1)?;

        let start = self.start.as_deref().map(parse_period).transpose()?;
        let end = self.end.as_deref().map(parse_period).transpose()?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ExtractError::InvalidPeriod(format!(
                    "start {s} is after end {e}"
                )));
            }
        }
        Ok(())
    }

    /// Same configuration, restricted to a single location.
    pub fn for_location(&self, location: &str) -> Self {
        let mut config = self.clone();
        config.selectors.location = vec![location.to_string()];
        config
    }
}

/// Validate a period code and return it unchanged.
///
/// Accepted: `YYYY`, `YYYY-MM`, `YYYY-Q1..4`, `YYYY-S1..2`. These forms
/// sort correctly as plain strings.
pub fn parse_period(raw: &str) -> ExtractResult<&str> {
    let s = raw.trim();
    let invalid = || {
        ExtractError::InvalidPeriod(format!(
            "'{raw}'. Expected one of: YYYY, YYYY-MM, YYYY-Q#, YYYY-S#."
        ))
    };

    let (year, rest) = match s.split_once('-') {
        Some((y, r)) => (y, Some(r)),
        None => (s, None),
    };
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;

    match rest {
        None => Ok(s),
        Some(r) if r.len() == 2 && r.chars().all(|c| c.is_ascii_digit()) => {
            let month: u32 = r.parse().map_err(|_| invalid())?;
            NaiveDate::from_ymd_opt(year, month, 1)
                .map(|_| s)
                .ok_or_else(invalid)
        }
        Some(r) => match r.as_bytes() {
            [b'Q', b'1'..=b'4'] | [b'S', b'1'..=b'2'] => Ok(s),
            _ => Err(invalid()),
        },
    }
}

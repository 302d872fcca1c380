//! Command-line parsing for the SDMX-JSON indicator extractor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the decoding/pivoting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    AxisPositions, AxisSelectors, ColumnRename, ExtractConfig, ViewPreset, ViewSpec,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "indices",
    version,
    about = "Economic indicator extractor (OECD SDMX-JSON)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch observations per country, pivot them and write the requested tables.
    Fetch(FetchArgs),
    /// List every observation-level axis of a dataset (index, code, name).
    Dimensions(RequestArgs),
}

/// What to request and how to read the response.
#[derive(Debug, Args, Clone)]
pub struct RequestArgs {
    /// Dataset identifier.
    #[arg(long, default_value = "MEI")]
    pub dataset: String,

    /// Location code; repeat for a batch (one run per country).
    #[arg(short = 'c', long = "country", default_values_t = vec!["IND".to_string()])]
    pub countries: Vec<String>,

    /// Subject code(s); none means every subject.
    #[arg(short = 's', long = "subject")]
    pub subjects: Vec<String>,

    /// Measure code(s); none means every measure.
    #[arg(short = 'm', long = "measure")]
    pub measures: Vec<String>,

    /// Frequency code(s) (A, Q, M).
    #[arg(short = 'f', long = "frequency", default_values_t = vec!["M".to_string()])]
    pub frequencies: Vec<String>,

    /// First period to request (YYYY, YYYY-MM, YYYY-Qn, YYYY-Sn).
    #[arg(long)]
    pub start: Option<String>,

    /// Last period to request.
    #[arg(long)]
    pub end: Option<String>,

    /// Key position of the subject axis.
    #[arg(long, default_value_t = 1)]
    pub subject_axis: usize,

    /// Key position of the measure axis.
    #[arg(long, default_value_t = 2)]
    pub measure_axis: usize,

    /// Key position of the time axis.
    #[arg(long, default_value_t = 4)]
    pub time_axis: usize,

    /// Separator between observation key components.
    #[arg(long, default_value_t = ':')]
    pub key_delimiter: char,

    /// SDMX-JSON root URL (overrides `OECD_BASE_URL`).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Read a saved SDMX-JSON message instead of calling the API.
    #[arg(long, value_name = "JSON")]
    pub payload: Option<PathBuf>,
}

/// Options for `indices fetch`.
#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Built-in view to write; repeatable.
    #[arg(long = "preset", value_enum)]
    pub presets: Vec<ViewPreset>,

    /// Explicit view: `NAME=COLUMN:LABEL,COLUMN:LABEL` (label defaults to the column).
    #[arg(long = "view", value_parser = parse_view_arg)]
    pub views: Vec<ViewSpec>,

    /// Prefix view: `NAME=PREFIX` keeps every column starting with PREFIX.
    #[arg(long = "prefix-view", value_parser = parse_prefix_view_arg)]
    pub prefix_views: Vec<ViewSpec>,

    /// Also write the full wide table as `wide.csv`.
    #[arg(long)]
    pub wide: bool,

    /// Output directory; each country gets its own subdirectory.
    #[arg(short = 'o', long, default_value = ".")]
    pub out: PathBuf,

    /// Keep the raw response as `payload.json` next to the tables.
    #[arg(long)]
    pub save_payload: bool,

    /// Print the first N rows of the wide table.
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,
}

/// Parse `NAME=COLUMN:LABEL,COLUMN:LABEL`.
pub fn parse_view_arg(raw: &str) -> Result<ViewSpec, String> {
    let (name, body) = split_named(raw)?;
    let mut columns = Vec::new();
    for item in body.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(format!("empty column in view '{raw}'"));
        }
        let rename = match item.split_once(':') {
            Some((column, label)) if !column.trim().is_empty() && !label.trim().is_empty() => {
                ColumnRename::new(column.trim(), label.trim())
            }
            Some(_) => return Err(format!("bad COLUMN:LABEL pair '{item}'")),
            None => ColumnRename::new(item, item),
        };
        columns.push(rename);
    }
    Ok(ViewSpec::explicit(name, columns))
}

/// Parse `NAME=PREFIX`.
pub fn parse_prefix_view_arg(raw: &str) -> Result<ViewSpec, String> {
    let (name, prefix) = split_named(raw)?;
    Ok(ViewSpec::prefix(name, prefix))
}

fn split_named(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((name, body)) if !name.trim().is_empty() && !body.trim().is_empty() => {
            Ok((name.trim(), body.trim()))
        }
        _ => Err(format!("expected NAME=..., got '{raw}'")),
    }
}

impl RequestArgs {
    /// Config for a request-only command (no views).
    pub fn to_config(&self) -> ExtractConfig {
        ExtractConfig {
            dataset: self.dataset.clone(),
            selectors: AxisSelectors {
                location: self.countries.clone(),
                subject: self.subjects.clone(),
                measure: self.measures.clone(),
                frequency: self.frequencies.clone(),
            },
            start: self.start.clone(),
            end: self.end.clone(),
            positions: AxisPositions {
                subject: self.subject_axis,
                measure: self.measure_axis,
                time: self.time_axis,
            },
            key_delimiter: self.key_delimiter,
            ..ExtractConfig::default()
        }
    }
}

impl FetchArgs {
    /// Views in order: presets, explicit views, prefix views.
    ///
    /// With nothing requested, only the wide table is written.
    pub fn to_config(&self) -> ExtractConfig {
        let views: Vec<ViewSpec> = self
            .presets
            .iter()
            .map(|p| p.view())
            .chain(self.views.iter().cloned())
            .chain(self.prefix_views.iter().cloned())
            .collect();
        let keep_wide = self.wide || views.is_empty();

        ExtractConfig {
            views,
            keep_wide,
            out_dir: self.out.clone(),
            ..self.request.to_config()
        }
    }
}

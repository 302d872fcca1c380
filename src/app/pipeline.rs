//! Shared extraction pipeline used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> decode axes + parse keys -> resolve -> pivot -> views -> sink
//!
//! Each stage fully consumes its input and returns a new value. A run either
//! produces every requested table or none of them.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::data::{DataRequest, Fetch};
use crate::domain::{DimensionAxis, ExtractConfig, WideTable};
use crate::error::ExtractResult;
use crate::io::{CsvSink, Sink, write_payload_json};
use crate::sdmx::{KeyFormat, SdmxMessage, decode_all, decode_axes, parse_observations};
use crate::transform::{extract_views, pivot, resolve};

/// Sink name of the full wide table when `keep_wide` is set.
pub const WIDE_TABLE_NAME: &str = "wide";

/// File name of the saved raw message inside a location's output directory.
pub const PAYLOAD_FILE_NAME: &str = "payload.json";

/// Outcome of turning one message into a wide table.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// At least one observation was returned.
    Data(WideTable),
    /// The request succeeded but matched no observations.
    NoData,
}

impl Extraction {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Extraction::NoData)
    }

    /// The wide table; empty for `NoData`.
    pub fn table(&self) -> WideTable {
        match self {
            Extraction::Data(table) => table.clone(),
            Extraction::NoData => WideTable::empty(),
        }
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// `+`-joined location selector of the run (e.g. `IND`).
    pub location: String,
    /// Where the data came from (URL or file path).
    pub source: String,
    pub observations: usize,
    pub extraction: Extraction,
    /// Requested views, in request order (plus `wide` when kept).
    pub views: Vec<(String, WideTable)>,
}

/// Turn a message into a wide table.
///
/// Empty observation mappings short-circuit to `NoData` before the structure
/// section is looked at: servers often send a skeletal structure with no data.
pub fn extract_table(message: &SdmxMessage, config: &ExtractConfig) -> ExtractResult<Extraction> {
    let raw = message.observations()?;
    if raw.is_empty() {
        return Ok(Extraction::NoData);
    }

    let axes = decode_axes(&message.structure, &config.axis_ids)?;
    debug!(
        arity = axes.arity,
        subjects = axes.subject.len(),
        measures = axes.measure.len(),
        periods = axes.time.len(),
        "decoded axes"
    );

    let observations = parse_observations(raw, KeyFormat::new(config.key_delimiter, axes.arity))?;
    let records = resolve(&observations, &axes, config.positions)?;
    debug!(records = records.len(), "resolved observations");

    let table = pivot(&records)?;
    debug!(rows = table.rows.len(), columns = table.columns.len(), "pivoted");

    Ok(Extraction::Data(table))
}

/// A configured extraction pipeline bound to one data source.
pub struct Pipeline<F: Fetch> {
    fetcher: F,
    config: ExtractConfig,
}

impl<F: Fetch> Pipeline<F> {
    /// Validate the configuration and bind it to a data source.
    pub fn new(fetcher: F, config: ExtractConfig) -> ExtractResult<Self> {
        config.validate()?;
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn request(&self) -> DataRequest {
        DataRequest::from_config(&self.config)
    }

    pub fn fetch_message(&self) -> ExtractResult<SdmxMessage> {
        Ok(self.fetcher.fetch(&self.request())?)
    }

    /// Every observation-level axis of the dataset, decoded.
    pub fn fetch_dimensions(&self) -> ExtractResult<Vec<DimensionAxis>> {
        let message = self.fetch_message()?;
        decode_all(&message.structure)
    }

    /// Run everything up to (not including) the sink.
    pub fn run(&self) -> ExtractResult<RunOutput> {
        let message = self.fetch_message()?;
        self.process(&message)
    }

    /// Extract, pivot and compute views for an already fetched message.
    pub fn process(&self, message: &SdmxMessage) -> ExtractResult<RunOutput> {
        let location = self.config.selectors.location.join("+");
        let request = self.request();
        info!(
            dataset = %self.config.dataset,
            location = %location,
            "starting extraction"
        );

        let observations = message.observations()?.len();
        let extraction = extract_table(message, &self.config)?;

        let views = match &extraction {
            Extraction::NoData => {
                warn!(location = %location, "no data for these parameters");
                Vec::new()
            }
            Extraction::Data(table) => {
                let mut views = extract_views(table, &self.config.views)?;
                if self.config.keep_wide {
                    views.push((WIDE_TABLE_NAME.to_string(), table.clone()));
                }
                views
            }
        };

        Ok(RunOutput {
            location,
            source: self.fetcher.describe(&request),
            observations,
            extraction,
            views,
        })
    }

    /// Run and hand every resulting table to `sink`.
    ///
    /// All views are computed before the first write, so a bad selection
    /// leaves the sink untouched.
    pub fn run_into<S: Sink>(&self, sink: &mut S) -> ExtractResult<RunOutput> {
        let output = self.run()?;
        write_views(&output, sink)?;
        Ok(output)
    }

    /// One independent run per location, in parallel, each written to
    /// `<out_dir>/<location>/`. Results come back in input order.
    pub fn run_batch(
        &self,
        locations: &[String],
        save_payload: bool,
    ) -> Vec<(String, ExtractResult<RunOutput>)> {
        locations
            .par_iter()
            .map(|location| {
                let result = self.run_location(location, save_payload);
                (location.clone(), result)
            })
            .collect()
    }

    fn run_location(&self, location: &str, save_payload: bool) -> ExtractResult<RunOutput> {
        let pipeline = Pipeline {
            fetcher: &self.fetcher,
            config: self.config.for_location(location),
        };
        let dir = self.location_dir(location);

        let message = pipeline.fetch_message()?;
        if save_payload {
            write_payload_json(&dir.join(PAYLOAD_FILE_NAME), &message)?;
        }

        let output = pipeline.process(&message)?;
        write_views(&output, &mut CsvSink::new(dir))?;
        Ok(output)
    }

    pub fn location_dir(&self, location: &str) -> PathBuf {
        self.config.out_dir.join(location)
    }
}

fn write_views<S: Sink>(output: &RunOutput, sink: &mut S) -> ExtractResult<()> {
    for (name, table) in &output.views {
        sink.write_table(name, table)?;
    }
    if !output.views.is_empty() {
        info!(location = %output.location, tables = output.views.len(), "tables written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::{AxisPositions, ColumnRename, ViewSpec};
    use crate::error::{ExtractError, FetchError};
    use crate::io::{MemorySink, PayloadFile};
    use crate::sdmx::fixtures::{empty_message, mei_message};

    /// Returns a fixed message, or a fixed HTTP status, and counts calls.
    struct StubFetch {
        message: Option<SdmxMessage>,
        status: u16,
        calls: AtomicUsize,
    }

    impl StubFetch {
        fn ok(message: SdmxMessage) -> Self {
            Self {
                message: Some(message),
                status: 200,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                message: None,
                status,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Fetch for StubFetch {
        fn fetch(&self, request: &DataRequest) -> Result<SdmxMessage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.message {
                Some(m) => Ok(m.clone()),
                None => Err(FetchError::Status {
                    status: self.status,
                    url: request.dimension_path(),
                }),
            }
        }
    }

    fn config() -> ExtractConfig {
        ExtractConfig {
            views: vec![
                ViewSpec::explicit(
                    "IndustryProduction",
                    vec![ColumnRename::new("PRINTO01_IXOBSA", "Total Industry Production")],
                ),
                ViewSpec::prefix("cpi", "CCRETT01_"),
            ],
            ..ExtractConfig::default()
        }
    }

    #[test]
    fn end_to_end_produces_wide_table_and_views() {
        let pipeline = Pipeline::new(StubFetch::ok(mei_message()), config()).unwrap();
        let mut sink = MemorySink::default();
        let out = pipeline.run_into(&mut sink).unwrap();

        assert_eq!(out.location, "IND");
        assert_eq!(out.observations, 6);

        let Extraction::Data(table) = &out.extraction else {
            panic!("expected data");
        };
        assert_eq!(table.columns, ["PRINTO01_IXOBSA", "CCRETT01_IXOBSA", "PRINTO01_IXOB"]);
        let periods: Vec<&str> = table.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, ["2018-01", "2018-02", "2018-03"]);
        assert_eq!(
            table.column_values("PRINTO01_IXOBSA").unwrap(),
            vec![Some(100.0), Some(101.0), Some(102.5)]
        );

        let ip = sink.get("IndustryProduction").unwrap();
        assert_eq!(ip.columns, ["Total Industry Production"]);
        assert_eq!(ip.rows.len(), 3);
        let cpi = sink.get("cpi").unwrap();
        assert_eq!(cpi.columns, ["CCRETT01_IXOBSA"]);
        assert_eq!(cpi.rows[0].values, vec![Some(5.5)]);
    }

    #[test]
    fn empty_observations_are_no_data_not_an_error() {
        let pipeline = Pipeline::new(StubFetch::ok(empty_message()), config()).unwrap();
        let mut sink = MemorySink::default();
        let out = pipeline.run_into(&mut sink).unwrap();

        assert!(out.extraction.is_no_data());
        assert!(out.extraction.table().is_empty());
        assert!(sink.tables.is_empty());
    }

    #[test]
    fn fetch_failure_status_passes_through() {
        let pipeline = Pipeline::new(StubFetch::failing(503), config()).unwrap();
        match pipeline.run() {
            Err(ExtractError::Fetch(e)) => assert_eq!(e.status(), Some(503)),
            other => panic!("expected fetch failure, got {other:?}"),
        }
    }

    #[test]
    fn unknown_column_writes_nothing() {
        let mut cfg = config();
        cfg.views.insert(0, ViewSpec::prefix("all_prod", "PRINTO01_"));
        cfg.views.push(ViewSpec::explicit(
            "broken",
            vec![ColumnRename::new("NOTPRESENT", "x")],
        ));
        let pipeline = Pipeline::new(StubFetch::ok(mei_message()), cfg).unwrap();
        let mut sink = MemorySink::default();

        assert!(matches!(
            pipeline.run_into(&mut sink),
            Err(ExtractError::UnknownColumn(_))
        ));
        assert!(sink.tables.is_empty());
    }

    #[test]
    fn structural_mismatch_aborts_the_run() {
        let mut msg = mei_message();
        msg.data_sets[0]
            .observations
            .insert("0:0:0:0:9".to_string(), serde_json::json!([1.0]));
        let pipeline = Pipeline::new(StubFetch::ok(msg), config()).unwrap();
        assert!(matches!(
            pipeline.run(),
            Err(ExtractError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_before_fetching() {
        let cfg = ExtractConfig {
            positions: AxisPositions {
                subject: 1,
                measure: 1,
                time: 4,
            },
            ..config()
        };
        assert!(Pipeline::new(StubFetch::ok(mei_message()), cfg).is_err());
    }

    #[test]
    fn keep_wide_appends_the_full_table() {
        let cfg = ExtractConfig {
            keep_wide: true,
            views: Vec::new(),
            ..config()
        };
        let pipeline = Pipeline::new(StubFetch::ok(mei_message()), cfg).unwrap();
        let out = pipeline.run().unwrap();
        assert_eq!(out.views.len(), 1);
        assert_eq!(out.views[0].0, WIDE_TABLE_NAME);
        assert_eq!(out.views[0].1, out.extraction.table());
    }

    #[test]
    fn batch_runs_each_location_into_its_own_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ExtractConfig {
            out_dir: tmp.path().to_path_buf(),
            ..config()
        };
        let pipeline = Pipeline::new(StubFetch::ok(mei_message()), cfg).unwrap();
        let locations = vec!["IND".to_string(), "USA".to_string(), "CZE".to_string()];

        let results = pipeline.run_batch(&locations, true);

        assert_eq!(pipeline.fetcher.calls.load(Ordering::SeqCst), 3);
        let order: Vec<&str> = results.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(order, ["IND", "USA", "CZE"]);
        for (location, result) in &results {
            let out = result.as_ref().unwrap();
            assert_eq!(&out.location, location);
            let dir = tmp.path().join(location);
            assert!(dir.join("IndustryProduction.csv").exists());
            assert!(dir.join("cpi.csv").exists());
            assert!(dir.join(PAYLOAD_FILE_NAME).exists());
        }
    }

    #[test]
    fn replayed_payload_is_not_copied_to_other_countries() {
        let tmp = tempfile::tempdir().unwrap();
        let payload = tmp.path().join("ind.json");
        write_payload_json(&payload, &mei_message()).unwrap();
        let cfg = ExtractConfig {
            out_dir: tmp.path().join("out"),
            keep_wide: true,
            ..config()
        };
        let pipeline = Pipeline::new(PayloadFile::new(&payload), cfg).unwrap();
        let locations = vec!["USA".to_string(), "FRA".to_string()];

        for (location, result) in pipeline.run_batch(&locations, false) {
            assert!(
                matches!(
                    result,
                    Err(ExtractError::Fetch(FetchError::LocationMismatch { .. }))
                ),
                "{location}: {result:?}"
            );
            assert!(!pipeline.location_dir(&location).exists());
        }

        let ok = pipeline.run_batch(&["IND".to_string()], false);
        assert!(ok[0].1.is_ok());
        assert!(pipeline.location_dir("IND").join(WIDE_TABLE_NAME.to_string() + ".csv").exists());
    }

    #[test]
    fn dimensions_are_listed_in_key_order() {
        let pipeline = Pipeline::new(StubFetch::ok(mei_message()), config()).unwrap();
        let axes = pipeline.fetch_dimensions().unwrap();
        assert_eq!(axes.len(), 5);
        assert_eq!(axes[0].entries[0].display_name, "India");
    }
}

//! Read/write raw SDMX-JSON messages on disk.
//!
//! A saved message lets a run be replayed offline (`--payload`) with exactly
//! the same structure and observations the API returned.

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{DataRequest, Fetch};
use crate::error::{FetchError, SinkError};
use crate::sdmx::SdmxMessage;

/// Axis id whose codes must match the requested locations on replay.
pub const LOCATION_AXIS: &str = "LOCATION";

/// A [`Fetch`] implementation that replays a saved message.
///
/// The request only selects which message is acceptable: a message whose
/// `LOCATION` codes fall outside the requested locations is rejected.
#[derive(Debug, Clone)]
pub struct PayloadFile {
    path: PathBuf,
}

impl PayloadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Fetch for PayloadFile {
    fn fetch(&self, request: &DataRequest) -> Result<SdmxMessage, FetchError> {
        info!(
            path = %self.path.display(),
            dataset = %request.dataset,
            "reading saved SDMX-JSON message"
        );
        let message = read_payload_json(&self.path)?;
        check_locations(&message, request)?;
        Ok(message)
    }

    fn describe(&self, _request: &DataRequest) -> String {
        self.path.display().to_string()
    }
}

/// Reject a message that covers locations the request did not ask for.
///
/// An empty location selector (or a message without a `LOCATION` axis)
/// accepts anything.
pub fn check_locations(message: &SdmxMessage, request: &DataRequest) -> Result<(), FetchError> {
    let requested = match request.dimensions.first() {
        Some(codes) if !codes.is_empty() => codes,
        _ => return Ok(()),
    };
    let Some(axis) = message
        .structure
        .dimensions
        .observation
        .iter()
        .find(|d| d.id == LOCATION_AXIS)
    else {
        return Ok(());
    };

    let found: Vec<String> = axis.values.iter().map(|v| v.id.clone()).collect();
    if found.iter().all(|code| requested.contains(code)) {
        Ok(())
    } else {
        Err(FetchError::LocationMismatch {
            requested: requested.clone(),
            found,
        })
    }
}

/// Read a saved message.
pub fn read_payload_json(path: &Path) -> Result<SdmxMessage, FetchError> {
    let file = File::open(path).map_err(|e| {
        FetchError::Transport(format!("failed to open payload '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| FetchError::Payload(e.to_string()))
}

/// Save a message so it can be replayed later.
pub fn write_payload_json(path: &Path, message: &SdmxMessage) -> Result<(), SinkError> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, message)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExtractConfig;
    use crate::sdmx::fixtures::mei_message;

    #[test]
    fn saved_message_replays_identically() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mei.json");
        let original = mei_message();
        write_payload_json(&path, &original).unwrap();

        let source = PayloadFile::new(&path);
        let request = DataRequest::from_config(&ExtractConfig::default());
        let replayed = source.fetch(&request).unwrap();

        let keys = |m: &SdmxMessage| -> Vec<String> {
            m.observations().unwrap().keys().cloned().collect()
        };
        assert_eq!(keys(&replayed), keys(&original));
        assert_eq!(replayed.declared_arity(), original.declared_arity());
    }

    #[test]
    fn replay_rejects_other_locations() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ind.json");
        write_payload_json(&path, &mei_message()).unwrap();
        let source = PayloadFile::new(&path);

        for location in ["USA", "FRA"] {
            let request = DataRequest::from_config(&ExtractConfig::default().for_location(location));
            match source.fetch(&request) {
                Err(FetchError::LocationMismatch { requested, found }) => {
                    assert_eq!(requested, vec![location.to_string()]);
                    assert_eq!(found, vec!["IND".to_string()]);
                }
                other => panic!("expected LocationMismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn wildcard_location_accepts_any_message() {
        let mut request = DataRequest::from_config(&ExtractConfig::default());
        request.dimensions[0].clear();
        assert!(check_locations(&mei_message(), &request).is_ok());

        request.dimensions[0] = vec!["USA".into(), "IND".into()];
        assert!(check_locations(&mei_message(), &request).is_ok());
    }

    #[test]
    fn missing_file_is_a_transport_error() {
        let err = read_payload_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn garbage_file_is_a_payload_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(read_payload_json(&path), Err(FetchError::Payload(_))));
    }
}

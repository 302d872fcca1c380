//! Error types.
//!
//! - [`ExtractError`]: everything that can abort one extraction run
//! - [`FetchError`]: failures reported by the fetch collaborator
//! - [`SinkError`]: failures reported while persisting a table
//! - [`AppError`]: what the binary reports (message + process exit code)
//!
//! Library code returns the typed enums; the binary converts them into an
//! `AppError` at the edge so exit codes stay in one place.

use thiserror::Error;

/// Exit code for invalid configuration, selections and sink failures.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for transport-level fetch failures.
pub const EXIT_FETCH: u8 = 4;
/// Exit code for payloads that do not match their declared structure.
pub const EXIT_PAYLOAD: u8 = 5;

// =============================================================================
// Fetch collaborator errors
// =============================================================================

/// Failures surfaced by a [`crate::data::Fetch`] implementation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success HTTP status.
    #[error("request to {url} failed with HTTP status {status}")]
    Status { status: u16, url: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("request failed: {0}")]
    Transport(String),

    /// A response arrived but is not an SDMX-JSON message.
    #[error("response is not valid SDMX-JSON: {0}")]
    Payload(String),

    /// A saved message holds locations other than the ones requested.
    #[error("saved message covers {found:?}, but {requested:?} was requested")]
    LocationMismatch {
        requested: Vec<String>,
        found: Vec<String>,
    },
}

impl FetchError {
    /// HTTP status carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// Sink errors
// =============================================================================

/// Failures while persisting a finalized table.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Extraction errors
// =============================================================================

/// Errors that abort a single extraction run.
///
/// Structural variants (`MissingAxis`, `MalformedKey`, `MalformedValue`,
/// `MalformedPayload`, `EmptyCode`, `IndexOutOfRange`) mean the payload does
/// not agree with its own structure section. No table is produced for them.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required axis id is absent from `structure.dimensions.observation`.
    #[error("required axis `{0}` is missing from the structure section")]
    MissingAxis(String),

    /// An axis value has an empty `id`.
    #[error("axis `{axis}` has an empty code at position {index}")]
    EmptyCode { axis: String, index: usize },

    /// An observation key does not split into the declared number of integers.
    #[error("malformed observation key `{key}`: {reason}")]
    MalformedKey { key: String, reason: String },

    /// An observation value is not `[number | null, ...]`.
    #[error("malformed value for observation `{key}`: {reason}")]
    MalformedValue { key: String, reason: String },

    /// The payload is missing a section the pipeline needs.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A key component points past the end of its axis.
    #[error("index {index} is out of range for axis `{axis}` ({len} values)")]
    IndexOutOfRange { axis: String, index: usize, len: usize },

    /// Two observations resolve to the same series/period with different values.
    #[error(
        "conflicting observations for {subject}_{measure} at {period}: {first:?} vs {second:?}"
    )]
    DuplicateObservation {
        subject: String,
        measure: String,
        period: String,
        first: Option<f64>,
        second: Option<f64>,
    },

    /// Two different subject/measure pairs join to the same column name.
    #[error(
        "column `{column}` is produced by both {first_subject}/{first_measure} and {second_subject}/{second_measure}"
    )]
    ColumnCollision {
        column: String,
        first_subject: String,
        first_measure: String,
        second_subject: String,
        second_measure: String,
    },

    /// An explicit view asked for a column the wide table does not have.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    /// The axis-position map does not fit the declared key layout.
    #[error("invalid axis position: {0}")]
    AxisPosition(String),

    /// A start/end bound is not a period code.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// Any other configuration problem detected before fetching.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to write table: {0}")]
    Sink(#[from] SinkError),
}

impl ExtractError {
    /// Process exit code used when this error ends the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExtractError::Fetch(FetchError::Payload(_)) => EXIT_PAYLOAD,
            ExtractError::Fetch(FetchError::LocationMismatch { .. }) => EXIT_CONFIG,
            ExtractError::Fetch(_) => EXIT_FETCH,
            ExtractError::UnknownColumn(_)
            | ExtractError::AxisPosition(_)
            | ExtractError::InvalidPeriod(_)
            | ExtractError::Config(_)
            | ExtractError::Sink(_) => EXIT_CONFIG,
            ExtractError::MissingAxis(_)
            | ExtractError::EmptyCode { .. }
            | ExtractError::MalformedKey { .. }
            | ExtractError::MalformedValue { .. }
            | ExtractError::MalformedPayload(_)
            | ExtractError::IndexOutOfRange { .. }
            | ExtractError::DuplicateObservation { .. }
            | ExtractError::ColumnCollision { .. } => EXIT_PAYLOAD,
        }
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

// =============================================================================
// Application error
// =============================================================================

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_is_passed_through() {
        let err: ExtractError = FetchError::Status {
            status: 404,
            url: "https://example.test/MEI".into(),
        }
        .into();
        let ExtractError::Fetch(inner) = &err else {
            panic!("expected a fetch error, got {err:?}");
        };
        assert_eq!(inner.status(), Some(404));
        assert_eq!(err.exit_code(), EXIT_FETCH);
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn structural_errors_map_to_payload_exit_code() {
        let app: AppError = ExtractError::MissingAxis("SUBJECT".into()).into();
        assert_eq!(app.exit_code(), EXIT_PAYLOAD);
        assert!(app.to_string().contains("SUBJECT"));

        let app: AppError = ExtractError::UnknownColumn("NOTPRESENT".into()).into();
        assert_eq!(app.exit_code(), EXIT_CONFIG);

        let mismatch: ExtractError = FetchError::LocationMismatch {
            requested: vec!["USA".into()],
            found: vec!["IND".into()],
        }
        .into();
        assert_eq!(mismatch.exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn duplicate_message_names_the_series() {
        let err = ExtractError::DuplicateObservation {
            subject: "GDP".into(),
            measure: "IXOB".into(),
            period: "2018-01".into(),
            first: Some(100.0),
            second: Some(105.0),
        };
        let msg = err.to_string();
        assert!(msg.contains("GDP_IXOB"));
        assert!(msg.contains("2018-01"));
    }
}

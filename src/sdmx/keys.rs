//! Observation parsing: compound key strings -> `Observation` records.
//!
//! Keys are split on a fixed delimiter into exactly `arity` non-negative
//! integers. Anything else is a `MalformedKey`; we never scan a key for
//! "whatever digits happen to be in it".

use serde_json::{Map, Value};

use crate::domain::{Observation, ObservationKey};
use crate::error::{ExtractError, ExtractResult};

/// Delimiter and component count every key must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFormat {
    pub delimiter: char,
    pub arity: usize,
}

impl KeyFormat {
    pub fn new(delimiter: char, arity: usize) -> Self {
        Self { delimiter, arity }
    }
}

impl ObservationKey {
    /// Parse a compound key such as `"0:3:1:0:17"`.
    pub fn parse(raw: &str, format: KeyFormat) -> ExtractResult<Self> {
        let malformed = |reason: String| ExtractError::MalformedKey {
            key: raw.to_string(),
            reason,
        };

        let parts: Vec<&str> = raw.split(format.delimiter).collect();
        if parts.len() != format.arity {
            return Err(malformed(format!(
                "expected {} components separated by '{}', found {}",
                format.arity,
                format.delimiter,
                parts.len()
            )));
        }

        let mut components = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(format!("component '{part}' is not a non-negative integer")));
            }
            let idx = part
                .parse::<usize>()
                .map_err(|e| malformed(format!("component '{part}': {e}")))?;
            components.push(idx);
        }

        Ok(ObservationKey(components))
    }

    /// Inverse of [`ObservationKey::parse`].
    pub fn encode(&self, delimiter: char) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&delimiter.to_string())
    }
}

/// Extract the observation value from `[value, attribute indices...]`.
///
/// Only the first element is meaningful; it must be a number or `null`.
pub fn parse_value(key: &str, raw: &Value) -> ExtractResult<Option<f64>> {
    let malformed = |reason: &str| ExtractError::MalformedValue {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let items = raw.as_array().ok_or_else(|| malformed("expected an array"))?;
    match items.first() {
        None => Err(malformed("empty value array")),
        Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| malformed("value is not a finite number")),
        Some(_) => Err(malformed("first element must be a number or null")),
    }
}

/// Parse every entry of an observation mapping, preserving payload order.
pub fn parse_observations(
    observations: &Map<String, Value>,
    format: KeyFormat,
) -> ExtractResult<Vec<Observation>> {
    observations
        .iter()
        .map(|(raw_key, raw_value)| {
            Ok(Observation {
                key: ObservationKey::parse(raw_key, format)?,
                value: parse_value(raw_key, raw_value)?,
            })
        })
        .collect()
}

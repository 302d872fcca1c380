//! SDMX-JSON message model and the two leaf decoders.
//!
//! - payload types (`SdmxMessage` and friends), deserialized with serde
//! - dimension decoding (`decoder`): axis descriptors -> positional lookups
//! - observation parsing (`keys`): `"i0:i1:...:iN" -> [value, ...]` entries -> `Observation`s
//!
//! Only observation-level dimensions are supported, i.e. messages requested
//! with `dimensionAtObservation=AllDimensions`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExtractError, ExtractResult, FetchError};

pub mod decoder;
pub mod keys;

pub use decoder::*;
pub use keys::*;

/// A complete SDMX-JSON data message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmxMessage {
    #[serde(default)]
    pub data_sets: Vec<DataSet>,
    pub structure: Structure,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSet {
    /// Compound key -> `[value, attribute indices...]`, in payload order.
    #[serde(default)]
    pub observations: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default)]
    pub name: Option<String>,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Axis descriptors in key order.
    #[serde(default)]
    pub observation: Vec<AxisDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<AxisValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisValue {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl SdmxMessage {
    /// Parse a message from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, FetchError> {
        serde_json::from_str(text).map_err(|e| FetchError::Payload(e.to_string()))
    }

    /// Number of axes every observation key must have.
    pub fn declared_arity(&self) -> usize {
        self.structure.dimensions.observation.len()
    }

    /// Observation mapping of the first data set.
    pub fn observations(&self) -> ExtractResult<&Map<String, Value>> {
        self.data_sets
            .first()
            .map(|ds| &ds.observations)
            .ok_or_else(|| ExtractError::MalformedPayload("message has no dataSets".to_string()))
    }
}

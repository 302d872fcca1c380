//! Dimension decoding: axis descriptors -> positional lookup tables.

use crate::domain::{AxisEntry, AxisIds, DimensionAxis};
use crate::error::{ExtractError, ExtractResult};
use crate::sdmx::{AxisDescriptor, Structure};

/// The three axes needed to name an observation, plus the key arity.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAxes {
    pub subject: DimensionAxis,
    pub measure: DimensionAxis,
    pub time: DimensionAxis,
    /// Number of observation-level axes declared by the structure.
    pub arity: usize,
}

/// Decode a single axis descriptor.
///
/// Entries keep the declared order, so `entries[i]` is positional index `i`.
/// Codes are kept byte for byte; a blank code is rejected.
pub fn decode_axis(descriptor: &AxisDescriptor) -> ExtractResult<DimensionAxis> {
    let mut entries = Vec::with_capacity(descriptor.values.len());
    for (index, value) in descriptor.values.iter().enumerate() {
        if value.id.trim().is_empty() {
            return Err(ExtractError::EmptyCode {
                axis: descriptor.id.clone(),
                index,
            });
        }
        entries.push(AxisEntry {
            index,
            code: value.id.clone(),
            display_name: value.name.clone(),
        });
    }

    Ok(DimensionAxis {
        id: descriptor.id.clone(),
        name: descriptor.name.clone(),
        entries,
    })
}

/// Decode every observation-level axis, in key order.
pub fn decode_all(structure: &Structure) -> ExtractResult<Vec<DimensionAxis>> {
    structure
        .dimensions
        .observation
        .iter()
        .map(decode_axis)
        .collect()
}

/// Select the subject, measure and time axes by id and decode them.
pub fn decode_axes(structure: &Structure, ids: &AxisIds) -> ExtractResult<DecodedAxes> {
    let find = |id: &str| -> ExtractResult<DimensionAxis> {
        let descriptor = structure
            .dimensions
            .observation
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ExtractError::MissingAxis(id.to_string()))?;
        decode_axis(descriptor)
    };

    Ok(DecodedAxes {
        subject: find(&ids.subject)?,
        measure: find(&ids.measure)?,
        time: find(&ids.time)?,
        arity: structure.dimensions.observation.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdmx::fixtures::mei_message;
    use crate::sdmx::{AxisValue, Dimensions};

    fn axis(id: &str, codes: &[&str]) -> AxisDescriptor {
        AxisDescriptor {
            id: id.to_string(),
            name: String::new(),
            values: codes
                .iter()
                .map(|c| AxisValue {
                    id: c.to_string(),
                    name: format!("{c} name"),
                })
                .collect(),
        }
    }

    #[test]
    fn lookups_are_total_over_the_axis_range() {
        let msg = mei_message();
        let axes = decode_axes(&msg.structure, &AxisIds::default()).unwrap();

        assert_eq!(axes.arity, 5);
        assert_eq!(axes.time.len(), 3);
        for i in 0..axes.time.len() {
            assert_eq!(axes.time.entries[i].index, i);
            assert!(axes.time.code(i).is_some());
        }
        assert_eq!(axes.time.code(3), None);
        assert_eq!(axes.subject.code(1), Some("CCRETT01"));
        assert_eq!(axes.measure.entries[0].display_name, "Index, s.a.");
    }

    #[test]
    fn missing_axis_is_reported_by_id() {
        let structure = Structure {
            name: None,
            dimensions: Dimensions {
                observation: vec![axis("SUBJECT", &["GDP"]), axis("TIME_PERIOD", &["2018-01"])],
            },
        };
        match decode_axes(&structure, &AxisIds::default()) {
            Err(ExtractError::MissingAxis(id)) => assert_eq!(id, "MEASURE"),
            other => panic!("expected MissingAxis, got {other:?}"),
        }
    }

    #[test]
    fn empty_code_is_rejected() {
        let err = decode_axis(&axis("SUBJECT", &["GDP", " "])).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyCode { index: 1, .. }));
    }

    #[test]
    fn codes_are_not_rewritten() {
        let decoded = decode_axis(&axis("SUBJECT", &[" GDP", "CPI "])).unwrap();
        assert_eq!(decoded.code(0), Some(" GDP"));
        assert_eq!(decoded.code(1), Some("CPI "));
    }

    #[test]
    fn custom_axis_ids_are_honoured() {
        let structure = Structure {
            name: None,
            dimensions: Dimensions {
                observation: vec![
                    axis("REF_AREA", &["IND"]),
                    axis("INDICATOR", &["GDP"]),
                    axis("UNIT", &["IXOB"]),
                    axis("PERIOD", &["2018-Q1"]),
                ],
            },
        };
        let ids = AxisIds {
            subject: "INDICATOR".into(),
            measure: "UNIT".into(),
            time: "PERIOD".into(),
        };
        let axes = decode_axes(&structure, &ids).unwrap();
        assert_eq!(axes.arity, 4);
        assert_eq!(axes.time.code(0), Some("2018-Q1"));
    }

    #[test]
    fn decode_all_keeps_key_order() {
        let msg = mei_message();
        let ids: Vec<String> = decode_all(&msg.structure)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, ["LOCATION", "SUBJECT", "MEASURE", "FREQUENCY", "TIME_PERIOD"]);
    }
}

//! Series resolution: positional keys -> `(subject, measure, period)` records.

use crate::domain::{AxisPositions, Observation, ResolvedRecord};
use crate::error::{ExtractError, ExtractResult};
use crate::sdmx::DecodedAxes;

/// Decode the subject, measure and time components of every observation.
///
/// Other key components (location, frequency, ...) are fixed per request and
/// dropped. Any component past the end of its axis aborts the whole batch:
/// skipping it would silently misattribute the remaining values.
pub fn resolve(
    observations: &[Observation],
    axes: &DecodedAxes,
    positions: AxisPositions,
) -> ExtractResult<Vec<ResolvedRecord>> {
    positions.validate(axes.arity)?;

    let mut out = Vec::with_capacity(observations.len());
    for obs in observations {
        let key = obs.key.components();
        if key.len() != axes.arity {
            return Err(ExtractError::MalformedKey {
                key: obs.key.encode(':'),
                reason: format!("expected {} components, found {}", axes.arity, key.len()),
            });
        }

        let subject = axes.subject.resolve(key[positions.subject])?;
        let measure = axes.measure.resolve(key[positions.measure])?;
        let time_period = axes.time.resolve(key[positions.time])?;

        out.push(ResolvedRecord::new(subject, measure, time_period, obs.value));
    }
    Ok(out)
}

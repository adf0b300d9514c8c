//! Validated observation series.

use crate::domain::Observation;
use crate::error::EngineError;

/// Non-empty, date-ascending sequence of observations.
///
/// The only way to build one is [`Series::new`], so holding a `Series` means
/// the ordering and value checks already passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Validate and wrap raw observations.
    ///
    /// Rejects empty input, dates that go backwards, and values that are
    /// negative or non-finite. Equal consecutive dates are allowed.
    pub fn new(observations: Vec<Observation>) -> Result<Self, EngineError> {
        if observations.is_empty() {
            return Err(EngineError::EmptySeries);
        }

        for (idx, obs) in observations.iter().enumerate() {
            check_value(obs, obs.primary, "primary value")?;
            check_value(obs, obs.secondary, "secondary value")?;

            if idx > 0 {
                let previous = observations[idx - 1].date;
                if obs.date < previous {
                    return Err(EngineError::UnorderedSeries {
                        index: idx,
                        previous,
                        date: obs.date,
                    });
                }
            }
        }

        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> &Observation {
        &self.observations[0]
    }

    pub fn last(&self) -> &Observation {
        &self.observations[self.observations.len() - 1]
    }
}

fn check_value(obs: &Observation, v: f64, what: &str) -> Result<(), EngineError> {
    if !v.is_finite() {
        return Err(EngineError::InvalidObservation {
            date: obs.date,
            reason: format!("{what} is not finite"),
        });
    }
    if v < 0.0 {
        return Err(EngineError::InvalidObservation {
            date: obs.date,
            reason: format!("{what} {v} is negative"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    #[test]
    fn rejects_empty_series() {
        assert_eq!(Series::new(vec![]), Err(EngineError::EmptySeries));
    }

    #[test]
    fn rejects_dates_going_backwards() {
        let err = Series::new(vec![
            Observation::new(d(3), 23.2, 1.4),
            Observation::new(d(10), 21.8, 1.4),
            Observation::new(d(5), 20.0, 1.4),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::UnorderedSeries {
                index: 2,
                previous: d(10),
                date: d(5),
            }
        );
    }

    #[test]
    fn allows_duplicate_dates() {
        let series = Series::new(vec![
            Observation::new(d(3), 23.2, 1.4),
            Observation::new(d(3), 23.0, 1.4),
        ])
        .unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn rejects_negative_and_nan_values() {
        let err = Series::new(vec![Observation::new(d(3), -1.0, 1.4)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObservation { .. }));

        let err = Series::new(vec![Observation::new(d(3), 1.0, f64::NAN)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidObservation { .. }));
    }
}

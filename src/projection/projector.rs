//! Daily projection of a fitted model.

use chrono::NaiveDate;

use crate::domain::{FittedModel, ProjectedCurve, ProjectedPoint};
use crate::error::EngineError;
use crate::models::predict;

/// Evaluate `model` on every calendar day from `start` through `end` inclusive.
///
/// Offsets are measured from `model.origin_date`, so `start` may lie before or
/// after the origin.
pub fn project(
    model: &FittedModel,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ProjectedCurve, EngineError> {
    if end < start {
        return Err(EngineError::InvalidProjectionRange { start, end });
    }

    let points = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let x = (date - model.origin_date).num_days() as f64;
            ProjectedPoint {
                date,
                value: predict(model.kind, x, &model.parameters),
            }
        })
        .collect();

    Ok(ProjectedCurve {
        kind: model.kind,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn decay(a: f64, k: f64, origin: NaiveDate) -> FittedModel {
        FittedModel {
            kind: ModelKind::Decay,
            parameters: vec![a, k],
            origin_date: origin,
        }
    }

    #[test]
    fn covers_every_day_inclusive() {
        let start = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let curve = project(&decay(10.0, 0.1, start), start, end).unwrap();

        assert_eq!(curve.points.len(), 14);
        assert_eq!(curve.first().unwrap().date, start);
        assert_eq!(curve.last().unwrap().date, end);
        assert!(curve.points.windows(2).all(|w| (w[1].date - w[0].date).num_days() == 1));
    }

    #[test]
    fn decay_projection_is_non_increasing() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let curve = project(&decay(30.0, 0.02, start), start, end).unwrap();
        assert!(curve.points.windows(2).all(|w| w[1].value <= w[0].value));
    }

    #[test]
    fn day_thirty_matches_closed_form() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = start + chrono::Duration::days(30);
        let curve = project(&decay(100.0, 0.1, start), start, end).unwrap();
        let last = curve.last().unwrap();
        assert!((last.value - 4.9787).abs() < 1e-3, "{}", last.value);
    }

    #[test]
    fn same_inputs_give_same_curve() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = start + chrono::Duration::days(90);
        let model = decay(42.0, 0.03, start);
        assert_eq!(project(&model, start, end).unwrap(), project(&model, start, end).unwrap());
    }

    #[test]
    fn reversed_range_is_an_error() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let err = project(&decay(1.0, 0.1, start), start, end).unwrap_err();
        assert_eq!(err, EngineError::InvalidProjectionRange { start, end });
    }
}

//! Threshold crossing search.
//!
//! A plain forward scan: the first projected value strictly below the
//! threshold wins. No monotonicity is assumed, so a curve that dips and
//! recovers still reports its first dip.

use crate::domain::{CrossingDate, ProjectedCurve, Threshold, ThresholdCrossing};

/// Date of the first point whose value is strictly less than `threshold`.
pub fn first_crossing(curve: &ProjectedCurve, threshold: f64) -> CrossingDate {
    curve
        .points
        .iter()
        .find(|p| p.value < threshold)
        .map_or(CrossingDate::NotFound, |p| CrossingDate::At(p.date))
}

/// Scan `curve` once per threshold.
pub fn crossings(curve: &ProjectedCurve, thresholds: &[Threshold]) -> Vec<ThresholdCrossing> {
    thresholds
        .iter()
        .map(|t| ThresholdCrossing {
            label: t.label.clone(),
            threshold_value: t.value,
            crossing: first_crossing(curve, t.value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FittedModel, ModelKind, ProjectedPoint};
    use crate::projection::project;
    use chrono::NaiveDate;

    fn curve(values: &[f64]) -> ProjectedCurve {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        ProjectedCurve {
            kind: ModelKind::Decay,
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| ProjectedPoint {
                    date: start + chrono::Duration::days(i as i64),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn equal_to_threshold_does_not_count() {
        let c = curve(&[10.0, 5.0, 4.9]);
        assert_eq!(
            first_crossing(&c, 5.0),
            CrossingDate::At(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap())
        );
    }

    #[test]
    fn first_dip_wins_on_non_monotone_curves() {
        let c = curve(&[10.0, 3.0, 12.0, 2.0]);
        assert_eq!(
            first_crossing(&c, 5.0),
            CrossingDate::At(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
        );
    }

    #[test]
    fn not_found_when_curve_stays_above() {
        let c = curve(&[10.0, 9.0, 8.0]);
        assert_eq!(first_crossing(&c, 5.0), CrossingDate::NotFound);
        assert_eq!(first_crossing(&curve(&[]), 5.0), CrossingDate::NotFound);
    }

    #[test]
    fn decay_from_one_hundred_crosses_five_on_day_thirty() {
        let origin = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let model = FittedModel {
            kind: ModelKind::Decay,
            parameters: vec![100.0, 0.1],
            origin_date: origin,
        };
        let c = project(&model, origin, origin + chrono::Duration::days(30)).unwrap();
        let found = crossings(&c, &[Threshold::new("CR", 5.0), Threshold::new("zero", 0.0)]);

        assert_eq!(found[0].crossing, CrossingDate::At(origin + chrono::Duration::days(30)));
        assert_eq!(found[1].crossing, CrossingDate::NotFound);
        assert_eq!(found[1].label, "zero");
    }
}

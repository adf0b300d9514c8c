//! Shared "projection pipeline" logic used by the report command and tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! split -> fit (per phase) -> project -> threshold scan, plus derived metrics.
//!
//! Front-ends can then focus on presentation (printing vs exports).

use tracing::{info, warn};

use crate::domain::{
    DerivedRow, PhaseFit, PhaseLabel, PhaseWindow, ProjectedCurve, ProjectionConfig, Series,
    ThresholdCrossing,
};
use crate::error::EngineError;
use crate::fit::{fit_phase, split_phase};
use crate::metrics::derive_rows;
use crate::projection::{crossings, project};

/// Successful fit + projection for one phase.
#[derive(Debug, Clone)]
pub struct PhaseProjection {
    pub window: PhaseWindow,
    pub fit: PhaseFit,
    pub curve: ProjectedCurve,
    pub crossings: Vec<ThresholdCrossing>,
}

/// What happened to one phase. A failure is kept, not swallowed.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub label: PhaseLabel,
    pub result: Result<PhaseProjection, EngineError>,
}

impl PhaseOutcome {
    pub fn projection(&self) -> Option<&PhaseProjection> {
        self.result.as_ref().ok()
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub series: Series,
    pub derived: Vec<DerivedRow>,
    pub pre: PhaseOutcome,
    pub post: PhaseOutcome,
}

/// Execute the full pipeline.
///
/// The two phases share no state, so they are fitted in parallel.
pub fn run_projection(series: Series, config: &ProjectionConfig) -> Result<RunOutput, EngineError> {
    config.solver.validate()?;
    if config.projection_end < config.cutover {
        return Err(EngineError::InvalidOptions(format!(
            "projection end {} is before cutover {}",
            config.projection_end, config.cutover
        )));
    }

    let (pre, post) = rayon::join(
        || run_phase(&series, PhaseLabel::Pre, config),
        || run_phase(&series, PhaseLabel::Post, config),
    );
    let derived = derive_rows(&series);

    Ok(RunOutput {
        series,
        derived,
        pre,
        post,
    })
}

/// Split, fit, project and scan a single phase.
pub fn run_phase(series: &Series, label: PhaseLabel, config: &ProjectionConfig) -> PhaseOutcome {
    let result = project_phase(series, label, config);
    match &result {
        Ok(p) => info!(
            phase = %label,
            model = p.fit.model.kind.display_name(),
            params = ?p.fit.model.parameters,
            rmse = p.fit.quality.rmse,
            iterations = p.fit.quality.iterations,
            "phase fitted"
        ),
        Err(e) => warn!(phase = %label, error = %e, "phase fit failed"),
    }
    PhaseOutcome { label, result }
}

fn project_phase(
    series: &Series,
    label: PhaseLabel,
    config: &ProjectionConfig,
) -> Result<PhaseProjection, EngineError> {
    let kind = label.model_kind();
    let window = split_phase(series, config.cutover, label, kind.param_count())?;

    let bounds = match label {
        PhaseLabel::Pre => None,
        PhaseLabel::Post => Some(&config.decay_bounds),
    };
    let fit = fit_phase(&window, kind, bounds, &config.solver)?;

    let curve = project(&fit.model, window.start_date, config.projection_end)?;
    let crossings = crossings(&curve, &config.thresholds);

    Ok(PhaseProjection {
        window,
        fit,
        curve,
        crossings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CrossingDate, ModelKind, Observation, Threshold};
    use crate::math::SolverOptions;
    use crate::models::{default_bounds, predict};
    use chrono::NaiveDate;

    fn config(cutover: NaiveDate, end: NaiveDate) -> ProjectionConfig {
        ProjectionConfig {
            cutover,
            projection_end: end,
            thresholds: vec![Threshold::new("VGPR", 10.0), Threshold::new("CR", 5.0)],
            solver: SolverOptions::default(),
            decay_bounds: default_bounds(ModelKind::Decay).unwrap(),
        }
    }

    /// Gompertz rise for 8 weeks, then exponential decay from the cutover.
    fn two_phase_series() -> (Series, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let cutover = start + chrono::Duration::days(56);
        let mut obs = Vec::new();
        for week in 0..=8 {
            let x = (week * 7) as f64;
            let v = predict(ModelKind::Saturating, x, &[30.0, 1.2, 0.06]);
            obs.push(Observation::new(start + chrono::Duration::days(week * 7), v, 1.4));
        }
        let peak = obs.last().unwrap().primary;
        for week in 1..=6 {
            let x = (week * 7) as f64;
            let v = predict(ModelKind::Decay, x, &[peak, 0.04]);
            obs.push(Observation::new(cutover + chrono::Duration::days(week * 7), v, 1.4));
        }
        (Series::new(obs).unwrap(), cutover)
    }

    #[test]
    fn both_phases_fit_and_post_crosses_thresholds() {
        let (series, cutover) = two_phase_series();
        let end = cutover + chrono::Duration::days(365);
        let out = run_projection(series, &config(cutover, end)).unwrap();

        let pre = out.pre.projection().expect("pre phase should fit");
        let post = out.post.projection().expect("post phase should fit");

        assert_eq!(out.derived.len(), out.series.len());
        assert_eq!(pre.curve.first().unwrap().date, out.series.first().date);
        assert_eq!(post.curve.first().unwrap().date, cutover);
        assert_eq!(post.curve.last().unwrap().date, end);
        assert!((post.fit.model.parameters[1] - 0.04).abs() < 1e-3);

        let vgpr = post.crossings[0].crossing.date().expect("VGPR reached");
        let cr = post.crossings[1].crossing.date().expect("CR reached");
        assert!(vgpr < cr);
    }

    #[test]
    fn insufficient_phase_is_reported_without_sinking_the_other() {
        let (series, _) = two_phase_series();
        let first = series.first().date;
        let end = first + chrono::Duration::days(400);
        let out = run_projection(series, &config(first, end)).unwrap();

        assert!(matches!(
            out.pre.result,
            Err(EngineError::InsufficientPhaseData { required: 3, got: 1, .. })
        ));
        // Post covers the whole series, so it has enough points to attempt a fit.
        assert!(!matches!(
            out.post.result,
            Err(EngineError::InsufficientPhaseData { .. })
        ));
    }

    #[test]
    fn solver_failure_is_kept_in_the_phase_outcome() {
        let (series, cutover) = two_phase_series();
        let mut cfg = config(cutover, cutover + chrono::Duration::days(90));
        cfg.solver.max_iter = 1;
        let out = run_projection(series, &cfg).unwrap();

        assert!(
            matches!(out.pre.result, Err(EngineError::FitDidNotConverge { iterations: 1, .. })),
            "got {:?}",
            out.pre.result
        );
        assert!(out.pre.projection().is_none());
        assert_eq!(out.pre.label, PhaseLabel::Pre);
        assert_eq!(out.derived.len(), out.series.len());
    }

    #[test]
    fn short_window_reports_not_found() {
        let (series, cutover) = two_phase_series();
        let end = cutover + chrono::Duration::days(3);
        let out = run_projection(series, &config(cutover, end)).unwrap();
        let post = out.post.projection().unwrap();
        assert!(post.crossings.iter().all(|c| c.crossing == CrossingDate::NotFound));
    }

    #[test]
    fn end_before_cutover_is_rejected() {
        let (series, cutover) = two_phase_series();
        let err = run_projection(series, &config(cutover, cutover - chrono::Duration::days(1)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidOptions(_)));
    }
}

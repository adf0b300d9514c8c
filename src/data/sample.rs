//! Synthetic light-chain series generation.
//!
//! Produces a data file shaped like a real course of treatment: a Gompertz
//! rise sampled at a fixed interval up to the cutover, then exponential decay
//! after it. Values carry multiplicative log-normal noise and are rounded to one
//! decimal the way lab reports print them. Output is deterministic per seed.

use chrono::{Duration, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::io::{DataFile, Measurement, Settings};
use crate::models::predict;

/// Knobs for [`generate_sample`].
#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub start: NaiveDate,
    /// Sampling intervals before the cutover (observations = intervals + 1).
    pub pre_intervals: usize,
    /// Sampling intervals after the cutover.
    pub post_intervals: usize,
    pub interval_days: i64,
    /// Gompertz `[A, B, C]` for the rise.
    pub saturating: [f64; 3],
    /// Decay rate after the cutover (per day).
    pub decay_rate: f64,
    /// Typical secondary (lambda) level.
    pub secondary_level: f64,
    /// Log-space noise standard deviation.
    pub noise_sigma: f64,
    pub seed: u64,
    /// Days past the cutover written as `projection_end_date`.
    pub horizon_days: i64,
    pub vgpr_threshold: f64,
    pub cr_threshold: f64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap_or_default(),
            pre_intervals: 10,
            post_intervals: 8,
            interval_days: 7,
            saturating: [40.0, 1.5, 0.05],
            decay_rate: 0.03,
            secondary_level: 1.4,
            noise_sigma: 0.03,
            seed: 42,
            horizon_days: 365,
            vgpr_threshold: 10.0,
            cr_threshold: 5.0,
        }
    }
}

pub fn generate_sample(spec: &SampleSpec) -> Result<DataFile, AppError> {
    if spec.interval_days <= 0 {
        return Err(AppError::new(2, "Sample interval must be > 0 days."));
    }
    if spec.pre_intervals < 2 || spec.post_intervals < 1 {
        return Err(AppError::new(
            2,
            "Sample needs at least 2 pre-cutover and 1 post-cutover intervals.",
        ));
    }
    if spec.horizon_days < 0 {
        return Err(AppError::new(2, "Sample horizon must be >= 0 days."));
    }
    if !(spec.noise_sigma.is_finite() && spec.noise_sigma >= 0.0) {
        return Err(AppError::new(
            2,
            format!("Sample noise must be finite and >= 0, got {}.", spec.noise_sigma),
        ));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let noise = Normal::new(0.0, spec.noise_sigma)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let mut measurements = Vec::with_capacity(spec.pre_intervals + spec.post_intervals + 1);

    for i in 0..=spec.pre_intervals {
        let x = i as i64 * spec.interval_days;
        let truth = predict(ModelKind::Saturating, x as f64, &spec.saturating);
        measurements.push(Measurement {
            date: spec.start + Duration::days(x),
            kappa: noisy(truth, noise.sample(&mut rng)),
            lambda: noisy(spec.secondary_level, noise.sample(&mut rng)).max(0.1),
        });
    }

    let cutover_offset = spec.pre_intervals as i64 * spec.interval_days;
    let cutover = spec.start + Duration::days(cutover_offset);
    let peak = predict(ModelKind::Saturating, cutover_offset as f64, &spec.saturating);

    for i in 1..=spec.post_intervals {
        let x = i as i64 * spec.interval_days;
        let truth = predict(ModelKind::Decay, x as f64, &[peak, spec.decay_rate]);
        measurements.push(Measurement {
            date: cutover + Duration::days(x),
            kappa: noisy(truth, noise.sample(&mut rng)),
            lambda: noisy(spec.secondary_level, noise.sample(&mut rng)).max(0.1),
        });
    }

    Ok(DataFile {
        measurements,
        settings: Settings {
            split_date: Some(cutover),
            projection_end_date: Some(cutover + Duration::days(spec.horizon_days)),
            vgpr_threshold: Some(spec.vgpr_threshold),
            cr_threshold: Some(spec.cr_threshold),
        },
    })
}

fn noisy(truth: f64, z: f64) -> f64 {
    (truth * z.exp() * 10.0).round() / 10.0
}

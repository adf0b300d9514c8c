//! Formatted terminal output: run summary and results table.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use chrono::NaiveDate;

use crate::app::pipeline::{PhaseOutcome, RunOutput};
use crate::domain::{CrossingDate, DerivedRow, ProjectionConfig, ThresholdCrossing};

/// Date style used in narrative lines ("Mar 04, 2026").
pub const LONG_DATE: &str = "%b %d, %Y";

/// Format the full run summary (dataset + per-phase fit + crossings).
pub fn format_run_summary(run: &RunOutput, config: &ProjectionConfig) -> String {
    let mut out = String::new();

    out.push_str("=== kappa - Light Chain Trajectory ===\n");
    out.push_str(&format!(
        "Observations: n={} | {} .. {} | latest kappa={:.1} mg/L\n",
        run.series.len(),
        run.series.first().date,
        run.series.last().date,
        run.series.last().primary,
    ));
    out.push_str(&format!(
        "Cutover: {} | Projection end: {}\n",
        config.cutover, config.projection_end
    ));

    out.push_str("\nPhase fits:\n");
    for phase in [&run.pre, &run.post] {
        out.push_str(&format_phase_fit(phase));
    }

    out.push_str("\nProjections:\n");
    for phase in [&run.pre, &run.post] {
        let Some(p) = phase.projection() else {
            out.push_str(&format!("  {:<5} no projection (fit failed)\n", phase.label));
            continue;
        };
        if let Some(last) = p.curve.last() {
            out.push_str(&format!(
                "  {:<5} projected {:.1} mg/L on {}\n",
                phase.label, last.value, last.date
            ));
        }
        for c in &p.crossings {
            out.push_str(&format!(
                "        {}\n",
                describe_crossing(c, config.projection_end)
            ));
        }
    }

    out
}

fn format_phase_fit(phase: &PhaseOutcome) -> String {
    match &phase.result {
        Ok(p) => {
            let model = &p.fit.model;
            let params: Vec<String> = model
                .kind
                .param_names()
                .iter()
                .zip(model.parameters.iter())
                .map(|(name, v)| format!("{name}={v:.6}"))
                .collect();
            format!(
                "  {:<5} {:<18} {} | n={} SSE={:.4} RMSE={:.4} iters={} | origin {}\n",
                phase.label,
                model.kind.display_name(),
                params.join(", "),
                p.fit.quality.n,
                p.fit.quality.sse,
                p.fit.quality.rmse,
                p.fit.quality.iterations,
                model.origin_date,
            )
        }
        Err(e) => format!("  {:<5} FAILED: {e}\n", phase.label),
    }
}

/// One-line description of a crossing, e.g. `CR (<5 mg/L) by Mar 04, 2026`.
pub fn describe_crossing(c: &ThresholdCrossing, window_end: NaiveDate) -> String {
    match c.crossing {
        CrossingDate::At(date) => format!(
            "{} (<{} mg/L) by {}",
            c.label,
            c.threshold_value,
            date.format(LONG_DATE)
        ),
        CrossingDate::NotFound => format!(
            "{} (<{} mg/L) not projected within window (ends {})",
            c.label,
            c.threshold_value,
            window_end.format(LONG_DATE)
        ),
    }
}

/// Format the results table (Date, Kappa, Lambda, Ratio, Δ, %Δ).
pub fn format_results_table(rows: &[DerivedRow]) -> String {
    let mut out = String::new();
    out.push_str("Free Light Chain Results\n");
    out.push_str(&format!(
        "{:<6} {:>8} {:>8} {:>7} {:>7} {:>8}\n",
        "Date", "Kappa", "Lambda", "Ratio", "Δ", "%Δ"
    ));
    out.push_str(&format!(
        "{:-<6} {:-<8} {:-<8} {:-<7} {:-<7} {:-<8}\n",
        "", "", "", "", "", ""
    ));

    for r in rows {
        let ratio = r
            .ratio
            .as_ref()
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|_| "n/a".to_string());
        let pct = r
            .percent_change
            .as_ref()
            .map(|v| format!("{v:.1}%"))
            .unwrap_or_else(|_| "n/a".to_string());
        out.push_str(&format!(
            "{:<6} {:>8.1} {:>8.1} {:>7} {:>+7.1} {:>8}\n",
            r.date.format("%m/%d"),
            r.primary,
            r.secondary,
            ratio,
            r.delta,
            pct,
        ));
    }

    out
}

//! Phase 3: Pairwise Pearson correlation between nutrient presence columns.

use crate::config::PresenceRecord;
use crate::error::Result;
use crate::graph::matrix::{CorrelationMatrix, PresenceMatrix};

/// Run the correlation phase: pivot, correlate, threshold.
pub fn run_correlation_phase(
    records: &[PresenceRecord],
    threshold: f64,
) -> Result<(PresenceMatrix, CorrelationMatrix)> {
    let presence = PresenceMatrix::from_records(records);
    let correlation = correlation_matrix(&presence)?.thresholded(threshold);

    log::info!(
        "{} foods x {} nutrients; {} nutrient pairs at r >= {}",
        presence.foods().len(),
        presence.nutrients().len(),
        correlation.upper_nonzero().count(),
        threshold
    );

    Ok((presence, correlation))
}

/// Pearson correlation of every pair of nutrient columns.
///
/// The diagonal is 0 (self-correlation removed) and undefined correlations,
/// from a constant column or fewer than two foods, are 0. Each unordered pair
/// is computed once and mirrored, so the result is exactly symmetric.
pub fn correlation_matrix(presence: &PresenceMatrix) -> Result<CorrelationMatrix> {
    let n = presence.nutrients().len();
    let centered: Vec<Vec<f64>> = (0..n).map(|k| center(presence.column(k))).collect();
    let norms: Vec<f64> = centered
        .iter()
        .map(|c| c.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect();
    let enough_rows = presence.foods().len() >= 2;

    let mut values = vec![0.0; n * n];
    for i in 0..n {
        for j in i + 1..n {
            let r = if enough_rows {
                dot(&centered[i], &centered[j]) / (norms[i] * norms[j])
            } else {
                f64::NAN
            };
            let r = if r.is_finite() { r } else { 0.0 };
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }

    CorrelationMatrix::new(presence.nutrients().to_vec(), values)
}

/// Pearson correlation of two equal-length samples; NaN when undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let cx = center(x);
    let cy = center(y);
    let sxy = dot(&cx, &cy);
    let sxx = dot(&cx, &cx);
    let syy = dot(&cy, &cy);
    sxy / (sxx.sqrt() * syy.sqrt())
}

fn center(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - mean).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

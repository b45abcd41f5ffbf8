//! Envelope filtering and dispersion statistics for raw ranging samples.

/// Central estimate and dispersion for a batch of distance samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredDistance {
    /// Mean of the surviving samples, cm, rounded to 2 decimals.
    pub mean: f64,
    /// Sample standard deviation (n-1), cm, rounded to 2 decimals. Zero for
    /// a single survivor.
    pub stddev: f64,
    /// Number of samples that survived the envelope filter.
    pub sample_count: usize,
}

/// Rounds to `digits` decimal places, matching the presentation the rest of
/// the rig expects.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Drops samples outside the exclusive `(min, max)` envelope and computes
/// mean and sample stddev over the survivors. Out-of-envelope samples are
/// discarded, never clamped. `None` when nothing survives.
pub fn filter_samples(samples: &[f64], min: f64, max: f64) -> Option<FilteredDistance> {
    let valid: Vec<f64> = samples
        .iter()
        .copied()
        .filter(|&s| s > min && s < max)
        .collect();
    if valid.is_empty() {
        return None;
    }

    let n = valid.len();
    let mean = valid.iter().sum::<f64>() / n as f64;
    let stddev = if n > 1 {
        let variance = valid.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    Some(FilteredDistance {
        mean: round_to(mean, 2),
        stddev: round_to(stddev, 2),
        sample_count: n,
    })
}

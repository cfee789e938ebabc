use serde::Serialize;

const HIGH_CONFIDENCE_SAMPLES: u32 = 15;
const MODERATE_CONFIDENCE_SAMPLES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Moderate,
    High,
}

impl Confidence {
    pub fn for_samples(sample_size: u32) -> Self {
        if sample_size >= HIGH_CONFIDENCE_SAMPLES {
            Confidence::High
        } else if sample_size >= MODERATE_CONFIDENCE_SAMPLES {
            Confidence::Moderate
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Moderate => "moderate",
            Confidence::High => "high",
        }
    }
}

/// A rate pulled toward its group prior. All rates are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShrinkageEstimate {
    pub raw_rate: f64,
    pub adjusted_rate: f64,
    pub prior_rate: f64,
    pub sample_size: u32,
    pub confidence: Confidence,
}

/// Blends the observed rate with the prior, weighting the prior as `k`
/// pseudo-observations.
pub fn shrink(observed_rate: f64, sample_size: u32, prior_rate: f64, k: f64) -> f64 {
    let n = sample_size as f64;
    if n + k <= 0.0 {
        return observed_rate;
    }
    (observed_rate * n + prior_rate * k) / (n + k)
}

pub fn estimate(observed_rate: f64, sample_size: u32, prior_rate: f64, k: f64) -> ShrinkageEstimate {
    ShrinkageEstimate {
        raw_rate: observed_rate,
        adjusted_rate: shrink(observed_rate, sample_size, prior_rate, k),
        prior_rate,
        sample_size,
        confidence: Confidence::for_samples(sample_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_samples_returns_prior() {
        assert!((shrink(0.33, 0, 0.05, 5.0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn large_samples_converge_to_observed() {
        let adjusted = shrink(0.12, 1_000_000, 0.03, 5.0);
        assert!((adjusted - 0.12).abs() < 1e-5);
    }

    #[test]
    fn small_sample_is_pulled_toward_prior() {
        // 1 error out of 3 evaluations against a 5% group mean
        let adjusted = shrink(1.0 / 3.0, 3, 0.05, 5.0);
        let expected = (1.0 + 0.25) / 8.0;
        assert!((adjusted - expected).abs() < 1e-9);
        assert!(adjusted < 1.0 / 3.0 && adjusted > 0.05);
    }

    #[test]
    fn zero_pseudo_count_keeps_observed() {
        assert_eq!(shrink(0.2, 4, 0.05, 0.0), 0.2);
        assert_eq!(shrink(0.2, 0, 0.05, 0.0), 0.2);
    }

    #[test]
    fn confidence_tiers_follow_sample_size() {
        assert_eq!(Confidence::for_samples(2), Confidence::Low);
        assert_eq!(Confidence::for_samples(5), Confidence::Moderate);
        assert_eq!(Confidence::for_samples(15), Confidence::High);
    }
}

//! Reuse-latency percentiles
//!
//! Percentiles use nearest-below selection: for `n` sorted samples the `p`th
//! percentile is `samples[n * p / 100]` with truncating integer division.
//! There is no interpolation between samples.

use serde::Serialize;

/// Seconds per day; latencies are reported in days
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// A reported percentile expressed as `numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentileSpec {
    /// Label used in reports, e.g. `99.9%`
    pub label: &'static str,
    /// Fraction numerator
    pub numerator: usize,
    /// Fraction denominator
    pub denominator: usize,
}

const fn pct(label: &'static str, numerator: usize, denominator: usize) -> PercentileSpec {
    PercentileSpec {
        label,
        numerator,
        denominator,
    }
}

/// The percentiles reported for every sample set, in ascending order
pub const PERCENTILES: [PercentileSpec; 12] = [
    pct("10%", 10, 100),
    pct("20%", 20, 100),
    pct("30%", 30, 100),
    pct("40%", 40, 100),
    pct("50%", 50, 100),
    pct("60%", 60, 100),
    pct("70%", 70, 100),
    pct("80%", 80, 100),
    pct("90%", 90, 100),
    pct("95%", 95, 100),
    pct("99%", 99, 100),
    pct("99.9%", 999, 1000),
];

impl PercentileSpec {
    /// Index of this percentile in a sorted sample set of length `len`
    #[must_use]
    pub const fn index(&self, len: usize) -> usize {
        len * self.numerator / self.denominator
    }
}

/// Convert raw time units (seconds) to days
#[must_use]
pub fn to_days(value: i64) -> f64 {
    value as f64 / SECONDS_PER_DAY
}

/// One reported percentile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileValue {
    /// Label such as `50%`
    pub label: &'static str,
    /// Raw latency at this percentile
    pub raw: i64,
    /// Latency in days
    pub days: f64,
}

/// Percentile summary of a non-empty sample set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    /// Number of samples
    pub samples: usize,
    /// Values for each entry of [`PERCENTILES`]
    pub percentiles: Vec<PercentileValue>,
    /// Largest raw latency
    pub max_raw: i64,
    /// Largest latency in days
    pub max_days: f64,
}

/// Latency summary for one sample set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Latency {
    /// No reuse events were recorded
    NoReuse,
    /// Percentiles over the recorded reuses
    Distribution(Distribution),
}

impl Latency {
    /// Sort `samples` and summarize them
    #[must_use]
    pub fn from_samples(mut samples: Vec<i64>) -> Self {
        samples.sort_unstable();
        let Some(&max_raw) = samples.last() else {
            return Self::NoReuse;
        };

        let percentiles = PERCENTILES
            .iter()
            .map(|spec| {
                let raw = samples[spec.index(samples.len())];
                PercentileValue {
                    label: spec.label,
                    raw,
                    days: to_days(raw),
                }
            })
            .collect();

        Self::Distribution(Distribution {
            samples: samples.len(),
            percentiles,
            max_raw,
            max_days: to_days(max_raw),
        })
    }

    /// The distribution, if any reuse was recorded
    #[must_use]
    pub const fn distribution(&self) -> Option<&Distribution> {
        match self {
            Self::NoReuse => None,
            Self::Distribution(d) => Some(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_samples_is_no_reuse() {
        assert_eq!(Latency::from_samples(Vec::new()), Latency::NoReuse);
    }

    #[test]
    fn test_single_sample() {
        let latency = Latency::from_samples(vec![86_400]);
        let dist = latency.distribution().unwrap();
        assert_eq!(dist.samples, 1);
        assert_eq!(dist.percentiles.len(), PERCENTILES.len());
        assert!(dist.percentiles.iter().all(|p| p.raw == 86_400));
        assert!((dist.max_days - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_nearest_below_indices() {
        // 0..10 unsorted; index = 10 * p / 100
        let samples = vec![9, 3, 0, 7, 1, 8, 2, 6, 4, 5];
        let dist = Latency::from_samples(samples);
        let dist = dist.distribution().unwrap();

        let raw: Vec<i64> = dist.percentiles.iter().map(|p| p.raw).collect();
        assert_eq!(raw, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 9]);
        assert_eq!(dist.max_raw, 9);
    }

    #[test]
    fn test_ninety_nine_point_nine_uses_thousandths() {
        let samples: Vec<i64> = (0..2000).collect();
        let dist = Latency::from_samples(samples);
        let dist = dist.distribution().unwrap();
        let last = dist.percentiles.last().unwrap();
        assert_eq!(last.label, "99.9%");
        assert_eq!(last.raw, 1998);
        assert_eq!(dist.percentiles[10].raw, 1980);
    }

    #[test]
    fn test_index_never_out_of_bounds() {
        for len in 1..50 {
            for spec in &PERCENTILES {
                assert!(spec.index(len) < len);
            }
        }
    }

    #[test]
    fn test_to_days() {
        assert!((to_days(43_200) - 0.5).abs() < f64::EPSILON);
        assert!(to_days(0).abs() < f64::EPSILON);
    }
}

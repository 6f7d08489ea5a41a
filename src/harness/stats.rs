//! Descriptive statistics over retrieval distances

use serde::Serialize;

/// Summary of a set of distances (typically each case's top-1 distance)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl DistanceStats {
    /// `None` for an empty input
    pub fn from_distances(distances: &[f32]) -> Option<Self> {
        if distances.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = distances.iter().map(|&d| f64::from(d)).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_stats() {
        assert!(DistanceStats::from_distances(&[]).is_none());
    }

    #[test]
    fn test_odd_count_median() {
        let stats = DistanceStats::from_distances(&[0.5, 0.25, 1.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.median, 0.5);
        assert_eq!(stats.min, 0.25);
        assert_eq!(stats.max, 1.0);
        assert!((stats.mean - 0.583_333).abs() < 1e-5);
    }

    #[test]
    fn test_even_count_median_averages_middle() {
        let stats = DistanceStats::from_distances(&[1.0, 0.0, 0.5, 0.25]).unwrap();
        assert_eq!(stats.median, 0.375);
    }
}

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

/// Distance used by the in-process index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexMetric {
    /// Squared Euclidean distance
    #[default]
    L2sq,
    /// Cosine distance
    Cos,
}

impl IndexMetric {
    fn kind(self) -> MetricKind {
        match self {
            IndexMetric::L2sq => MetricKind::L2sq,
            IndexMetric::Cos => MetricKind::Cos,
        }
    }
}

impl std::str::FromStr for IndexMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "l2" | "l2sq" | "euclidean" => Ok(IndexMetric::L2sq),
            "cos" | "cosine" => Ok(IndexMetric::Cos),
            other => Err(anyhow!("Unknown metric '{}', expected 'l2' or 'cosine'", other)),
        }
    }
}

/// Thin wrapper over a usearch HNSW index keyed by u64
pub struct UsearchWrapper {
    index: Index,
    dimensions: usize,
}

impl UsearchWrapper {
    pub fn new(dimensions: usize, metric: IndexMetric) -> Result<Self> {
        let options = IndexOptions {
            dimensions,
            metric: metric.kind(),
            quantization: ScalarKind::F32,
            ..Default::default()
        };
        let index = Index::new(&options)
            .map_err(|e| anyhow!("Failed to create vector index: {}", e))?;
        Ok(Self { index, dimensions })
    }

    pub fn reserve(&self, capacity: usize) -> Result<()> {
        self.index
            .reserve(capacity)
            .map_err(|e| anyhow!("Failed to reserve {} slots: {}", capacity, e))
    }

    pub fn add(&self, key: u64, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(anyhow!(
                "Vector for key {} has {} dimensions, index expects {}",
                key,
                vector.len(),
                self.dimensions
            ));
        }
        self.index
            .add(key, vector)
            .map_err(|e| anyhow!("Failed to add vector {}: {}", key, e))
    }

    /// Nearest `k` keys with their distances, closest first
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        let matches = self
            .index
            .search(vector, k)
            .map_err(|e| anyhow!("Vector search failed: {}", e))?;
        Ok(matches.keys.into_iter().zip(matches.distances).collect())
    }

    pub fn size(&self) -> usize {
        self.index.size()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_neighbour_order() {
        let index = UsearchWrapper::new(4, IndexMetric::L2sq).unwrap();
        index.reserve(3).unwrap();
        index.add(1, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        index.add(2, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        index.add(3, &[0.9, 0.1, 0.0, 0.0]).unwrap();
        assert_eq!(index.size(), 3);

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 3);
        assert!(results[0].1 <= results[1].1);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let index = UsearchWrapper::new(4, IndexMetric::Cos).unwrap();
        index.reserve(1).unwrap();
        assert!(index.add(1, &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("euclidean".parse::<IndexMetric>().unwrap(), IndexMetric::L2sq);
        assert_eq!("Cosine".parse::<IndexMetric>().unwrap(), IndexMetric::Cos);
        assert!("manhattan".parse::<IndexMetric>().is_err());
    }
}

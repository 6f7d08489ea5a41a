//! ragbench: evaluation harness for semantic search.
//!
//! This library provides:
//! - A retrieval harness scoring any [`Retriever`] by Recall@K, distance
//!   thresholds and side-by-side query pairs
//! - News-headline corpus subsets with stable `doc_<index>` ids
//! - A fastembed + usearch retriever over such a subset
//! - Text and JSON report rendering, and an interactive search console
//!
//! # Example
//!
//! ```rust
//! use ragbench::{HarnessConfig, RecallCase, RecordedRetriever, RetrievalHarness, ScoredDoc};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let retriever = RecordedRetriever::new().with(
//!         "passenger hits flight attendant",
//!         vec![ScoredDoc::new("doc_1", 0.1), ScoredDoc::new("doc_3590", 0.4)],
//!     );
//!     let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());
//!     let cases = [RecallCase::new("passenger hits flight attendant", "doc_1")];
//!     let report = harness.evaluate_recall(&cases, 3).await.unwrap();
//!     assert_eq!(report.score, 1.0);
//! });
//! ```

pub mod ai;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod harness;
pub mod report;
pub mod retriever;
pub mod vector;

pub use crate::corpus::{Corpus, Document};
pub use crate::error::{RagbenchError, RagbenchResult};
pub use crate::harness::{
    DistanceStats, HarnessConfig, PairCase, PairReport, RecallCase, RecallReport,
    RelationshipKind, RetrievalHarness, ScoredDoc, ThresholdCase, ThresholdReport,
};
pub use crate::retriever::{RecordedRetriever, Retriever};
#[cfg(all(feature = "embedding", feature = "vector"))]
pub use crate::retriever::VectorRetriever;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for evaluation runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw News Category dataset (JSON Lines)
    pub dataset_path: PathBuf,
    /// Subset written by `ragbench subset` and indexed for evaluation
    pub subset_path: PathBuf,
    /// Index metric for the vector retriever: "l2" or "cosine"
    pub metric: String,
    pub recall_k: usize,
    pub threshold_k: usize,
    pub pairs_k: usize,
    /// Distance cut-off for threshold analysis; deliberately unset by default
    pub threshold: Option<f32>,
    pub harness: HarnessConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./data/News_Category_Dataset_v3.json"),
            subset_path: PathBuf::from("./data/test_data_subset.json"),
            metric: "l2".to_string(),
            recall_k: 3,
            threshold_k: 5,
            pairs_k: 5,
            threshold: None,
            harness: HarnessConfig::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> RagbenchResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RagbenchError::Configuration(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| {
            RagbenchError::Configuration(format!("invalid config '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RagbenchResult<()> {
        self.harness.validate()?;
        for (name, k) in [
            ("recall_k", self.recall_k),
            ("threshold_k", self.threshold_k),
            ("pairs_k", self.pairs_k),
        ] {
            if k == 0 {
                return Err(RagbenchError::Configuration(format!("{} must be positive", name)));
            }
        }
        if let Some(t) = self.threshold {
            if !t.is_finite() {
                return Err(RagbenchError::Configuration(format!(
                    "threshold must be finite, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

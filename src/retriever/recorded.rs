use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use super::Retriever;
use crate::harness::ScoredDoc;

/// Replays stored retrieval runs.
///
/// The on-disk form is a JSON object mapping each query to its ranked
/// `[id, distance]` pairs:
///
/// ```json
/// { "Tell me about the new Ant-Man movie trailer.": [["doc_8413", 0.61], ["doc_12", 0.97]] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordedRetriever {
    runs: HashMap<String, Vec<ScoredDoc>>,
}

impl RecordedRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the ranked results for a query, replacing any previous entry
    pub fn insert(&mut self, query: impl Into<String>, results: Vec<ScoredDoc>) {
        self.runs.insert(query.into(), results);
    }

    pub fn with(mut self, query: impl Into<String>, results: Vec<ScoredDoc>) -> Self {
        self.insert(query, results);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<(String, f32)>> =
            serde_json::from_str(json).context("Failed to parse recorded results")?;
        let runs = raw
            .into_iter()
            .map(|(query, pairs)| {
                let docs = pairs
                    .into_iter()
                    .map(|(id, distance)| ScoredDoc::new(id, distance))
                    .collect();
                (query, docs)
            })
            .collect();
        Ok(Self { runs })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recorded results from '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[async_trait]
impl Retriever for RecordedRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        let results = self
            .runs
            .get(query)
            .ok_or_else(|| anyhow!("no recorded results for query '{}'", query))?;
        Ok(results.iter().take(k).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_truncates_to_k() {
        let retriever = RecordedRetriever::from_json_str(
            r#"{"cats": [["doc_2", 0.3], ["doc_9", 0.5], ["doc_4", 0.8]]}"#,
        )
        .unwrap();

        let results = retriever.retrieve("cats", 2).await.unwrap();
        assert_eq!(
            results,
            vec![ScoredDoc::new("doc_2", 0.3), ScoredDoc::new("doc_9", 0.5)]
        );
    }

    #[tokio::test]
    async fn test_unknown_query_is_an_error() {
        let retriever = RecordedRetriever::new().with("known", vec![]);
        assert!(retriever.retrieve("known", 3).await.unwrap().is_empty());

        let err = retriever.retrieve("unknown", 3).await.unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(RecordedRetriever::from_json_str(r#"{"q": [["doc_1"]]}"#).is_err());
    }
}

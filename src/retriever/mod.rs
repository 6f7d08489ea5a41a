//! The retrieval capability consumed by the harness, plus adapters

mod recorded;
#[cfg(all(feature = "embedding", feature = "vector"))]
mod vector;

pub use recorded::RecordedRetriever;
#[cfg(all(feature = "embedding", feature = "vector"))]
pub use vector::VectorRetriever;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::harness::ScoredDoc;

/// Anything that can answer "top `k` documents for this text".
///
/// Implementations return results ascending by distance (lower is closer),
/// at most `k` of them, each id at most once. An empty corpus yields an empty
/// list rather than an error. The harness checks this contract on every call.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>>;
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        (**self).retrieve(query, k).await
    }
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Box<T> {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        (**self).retrieve(query, k).await
    }
}

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::Retriever;
use crate::ai::EmbeddingWrapper;
use crate::corpus::Corpus;
use crate::harness::{DocId, ScoredDoc};
use crate::vector::{IndexMetric, UsearchWrapper};

/// Headlines embedded per call to the model
pub const EMBED_BATCH_SIZE: usize = 1000;

/// Embeds a corpus into an in-process index and answers queries against it
pub struct VectorRetriever {
    embedding: EmbeddingWrapper,
    index: UsearchWrapper,
    /// Index key `n` is the document at position `n`
    ids: Vec<DocId>,
}

impl VectorRetriever {
    /// Embed every headline of `corpus` and index it
    pub fn build(corpus: &Corpus, embedding: EmbeddingWrapper, metric: IndexMetric) -> Result<Self> {
        let index = UsearchWrapper::new(embedding.dimensions(), metric)?;
        index.reserve(corpus.len())?;

        let documents = corpus.documents();
        for (batch_no, batch) in documents.chunks(EMBED_BATCH_SIZE).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|d| d.headline.as_str()).collect();
            let vectors = embedding
                .generate(&texts)
                .with_context(|| format!("Failed to embed batch {}", batch_no + 1))?;

            let offset = batch_no * EMBED_BATCH_SIZE;
            for (i, vector) in vectors.iter().enumerate() {
                index.add((offset + i) as u64, vector)?;
            }
            info!("Indexed batch {} ({} headlines)", batch_no + 1, batch.len());
        }

        info!("Vector index ready with {} documents", index.size());
        Ok(Self {
            embedding,
            index,
            ids: documents.iter().map(|d| d.id.clone()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        if self.ids.is_empty() {
            return Ok(Vec::new());
        }

        // The model runs on the CPU; keep it off the async workers
        let embedding = self.embedding.clone();
        let text = query.to_string();
        let vector = tokio::task::spawn_blocking(move || embedding.generate_one(&text))
            .await
            .context("Embedding task panicked")??;

        self.index
            .search(&vector, k)?
            .into_iter()
            .map(|(key, distance)| {
                let id = self
                    .ids
                    .get(key as usize)
                    .ok_or_else(|| anyhow!("Index returned unknown key {}", key))?;
                // Cosine distance can dip just below zero from rounding
                Ok(ScoredDoc::new(id.clone(), distance.max(0.0)))
            })
            .collect()
    }
}

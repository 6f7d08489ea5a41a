use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Sentence-embedding model used for news headlines (384 dimensions)
pub const DEFAULT_MODEL: EmbeddingModel = EmbeddingModel::AllMiniLML6V2;

/// A wrapper around fastembed TextEmbedding for turning headlines and queries into vectors
pub struct EmbeddingWrapper {
    model: Arc<TextEmbedding>,
    dimensions: usize,
}

impl EmbeddingWrapper {
    /// Load the default headline model
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL)
    }

    /// Create a new EmbeddingWrapper with custom options
    pub fn with_options(options: InitOptions) -> Result<Self> {
        let model_name = options.model_name.clone();
        let model = TextEmbedding::try_new(options)
            .map_err(|e| anyhow!("Failed to load embedding model {:?}: {}", model_name, e))?;
        let dimensions = TextEmbedding::get_model_info(&model_name)
            .map(|info| info.dim)
            .map_err(|e| anyhow!("Unknown embedding model {:?}: {}", model_name, e))?;

        Ok(Self {
            model: Arc::new(model),
            dimensions,
        })
    }

    /// Create a new EmbeddingWrapper with a specific model
    pub fn with_model(model: EmbeddingModel) -> Result<Self> {
        let mut options = InitOptions::default();
        options.model_name = model;
        Self::with_options(options)
    }

    /// Generate embeddings for a list of texts
    pub fn generate(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| anyhow!("Failed to generate embeddings: {}", e))
    }

    /// Generate embeddings for a single text
    pub fn generate_one(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| anyhow!("Failed to generate embedding: {}", e))?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedding model returned no vector"))
    }

    /// Vector length produced by the loaded model
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Clone for EmbeddingWrapper {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            dimensions: self.dimensions,
        }
    }
}

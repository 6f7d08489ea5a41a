#[cfg(feature = "embedding")]
mod embedding;

#[cfg(feature = "embedding")]
pub use embedding::{EmbeddingWrapper, DEFAULT_MODEL};

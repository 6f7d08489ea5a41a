#[cfg(feature = "vector")]
mod usearch_wrapper;

#[cfg(feature = "vector")]
pub use usearch_wrapper::{IndexMetric, UsearchWrapper};

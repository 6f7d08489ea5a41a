//! News-headline corpus: subset construction, document lookup and case files

pub mod cases;
mod subset;

pub use subset::{
    build_subset, load_news_jsonl, load_subset, write_subset, NewsRecord, DEFAULT_CATEGORY_COUNT,
    DEFAULT_MAX_RECORDS,
};

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::harness::DocId;

/// A headline with its stable id; never mutated once the subset is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub headline: String,
    /// Only used to pick the subset, never for scoring
    #[serde(default)]
    pub category: String,
}

/// Documents in source order with id lookup
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    by_id: HashMap<DocId, usize>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(documents.len());
        for (pos, doc) in documents.iter().enumerate() {
            if by_id.insert(doc.id.clone(), pos).is_some() {
                bail!("Duplicate document id '{}' in corpus", doc.id);
            }
        }
        Ok(Self { documents, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|&pos| &self.documents[pos])
    }

    pub fn headline(&self, id: &str) -> Option<&str> {
        self.get(id).map(|d| d.headline.as_str())
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

//! Cases, ranked results and score reports exchanged with the harness

use serde::{Deserialize, Serialize};

use super::stats::DistanceStats;

/// Stable document identifier, `doc_<index>` for corpus subsets
pub type DocId = String;

/// One (document id, distance) pair returned by a retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub id: DocId,
    pub distance: f32,
}

impl ScoredDoc {
    pub fn new(id: impl Into<DocId>, distance: f32) -> Self {
        Self {
            id: id.into(),
            distance,
        }
    }
}

/// Ranked results for one query, ascending by distance
pub type RetrievalResult = Vec<ScoredDoc>;

/// Golden-set entry: a query and the single document known to answer it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallCase {
    pub query: String,
    pub expected_id: DocId,
}

impl RecallCase {
    pub fn new(query: impl Into<String>, expected_id: impl Into<DocId>) -> Self {
        Self {
            query: query.into(),
            expected_id: expected_id.into(),
        }
    }
}

/// Query probed against a distance cut-off.
///
/// A case without its own threshold falls back to the batch threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCase {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

impl ThresholdCase {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            threshold: None,
        }
    }

    pub fn with_threshold(query: impl Into<String>, threshold: f32) -> Self {
        Self {
            query: query.into(),
            threshold: Some(threshold),
        }
    }
}

/// How the two queries of a pair are meant to relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// Different wording, same meaning
    Synonymy,
    /// Shared wording, different meaning depending on context
    Polysemy,
    /// Near-identical wording, deliberately different intent
    Foil,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Synonymy => "synonymy",
            RelationshipKind::Polysemy => "polysemy",
            RelationshipKind::Foil => "foil",
        }
    }

    /// What a reviewer should expect to see for a well-behaved retriever
    pub fn expected_signature(&self) -> &'static str {
        match self {
            RelationshipKind::Synonymy => "large overlap, small top-1 distance delta",
            RelationshipKind::Polysemy => "low overlap and/or large top-1 distance delta",
            RelationshipKind::Foil => "near-zero overlap",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synonymy" | "synonym" => Ok(RelationshipKind::Synonymy),
            "polysemy" | "context" => Ok(RelationshipKind::Polysemy),
            "foil" => Ok(RelationshipKind::Foil),
            other => Err(format!("unknown relationship kind '{}'", other)),
        }
    }
}

/// Two queries compared side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCase {
    pub query_a: String,
    pub query_b: String,
    pub relationship_kind: RelationshipKind,
    /// Document the pair was written around, marked in the report when retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<DocId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PairCase {
    pub fn new(
        query_a: impl Into<String>,
        query_b: impl Into<String>,
        relationship_kind: RelationshipKind,
    ) -> Self {
        Self {
            query_a: query_a.into(),
            query_b: query_b.into(),
            relationship_kind,
            target_id: None,
            description: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<DocId>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// How a single case's retrieval call ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseStatus {
    Scored,
    TimedOut,
    Failed { message: String },
}

impl CaseStatus {
    pub fn is_scored(&self) -> bool {
        matches!(self, CaseStatus::Scored)
    }
}

/// Per-case Recall@K outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallCaseReport {
    pub query: String,
    pub expected_id: DocId,
    pub hit: bool,
    /// 1-based position of the expected id, when present
    pub rank: Option<usize>,
    pub retrieved_ids: Vec<DocId>,
    pub distances: Vec<f32>,
    pub status: CaseStatus,
}

/// Recall@K over a golden set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallReport {
    pub k: usize,
    pub total_cases: usize,
    pub hits: usize,
    pub score: f64,
    /// Mean reciprocal rank; misses contribute zero
    pub mrr: f64,
    pub timed_out: usize,
    pub failed: usize,
    pub distance_stats: Option<DistanceStats>,
    pub per_case: Vec<RecallCaseReport>,
}

impl RecallReport {
    /// "H out of N" form of the score
    pub fn summary(&self) -> String {
        format!("{} out of {}", self.hits, self.total_cases)
    }

    pub fn misses(&self) -> impl Iterator<Item = &RecallCaseReport> {
        self.per_case.iter().filter(|c| !c.hit)
    }
}

/// Per-query threshold partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdCaseReport {
    pub query: String,
    pub threshold: f32,
    pub accepted: Vec<ScoredDoc>,
    pub rejected: Vec<ScoredDoc>,
    /// No result fell under the threshold; check `status` to tell a timeout apart
    pub all_rejected: bool,
    pub status: CaseStatus,
}

/// Distance-threshold filtering over a set of probe queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdReport {
    /// Batch threshold applied to cases without their own
    pub threshold: Option<f32>,
    pub k: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub distance_stats: Option<DistanceStats>,
    pub per_case: Vec<ThresholdCaseReport>,
}

/// Side-by-side numbers for one query pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCaseReport {
    pub query_a: String,
    pub query_b: String,
    pub relationship_kind: RelationshipKind,
    pub expected_signature: String,
    pub retrieved_a: Vec<ScoredDoc>,
    pub retrieved_b: Vec<ScoredDoc>,
    /// Ids present in both top-K lists, sorted
    pub overlap_ids: Vec<DocId>,
    pub overlap_count: usize,
    pub top1_distance_a: Option<f32>,
    pub top1_distance_b: Option<f32>,
    /// Absent when either side returned nothing
    pub top1_distance_delta: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<DocId>,
    pub target_rank_a: Option<usize>,
    pub target_rank_b: Option<usize>,
    pub status: CaseStatus,
}

/// Qualitative robustness comparison; advisory only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub k: usize,
    pub per_case: Vec<PairCaseReport>,
}

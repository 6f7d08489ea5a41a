use std::collections::{BTreeSet, HashSet};

use tracing::{info, instrument};

use super::{
    check_batch_input, CaseStatus, DocId, Fetched, PairCase, PairCaseReport, PairReport,
    RetrievalHarness, ScoredDoc,
};
use crate::error::RagbenchResult;
use crate::retriever::Retriever;

/// Ids present in both result lists, sorted so the answer does not depend
/// on argument order
pub fn overlap_ids(a: &[ScoredDoc], b: &[ScoredDoc]) -> Vec<DocId> {
    let in_b: HashSet<&str> = b.iter().map(|d| d.id.as_str()).collect();
    a.iter()
        .filter(|d| in_b.contains(d.id.as_str()))
        .map(|d| d.id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn rank_of(docs: &[ScoredDoc], id: &str) -> Option<usize> {
    docs.iter().position(|d| d.id == id).map(|pos| pos + 1)
}

impl<'r, R: Retriever + ?Sized> RetrievalHarness<'r, R> {
    /// Retrieve both queries of each pair and report how their results
    /// relate.
    ///
    /// Nothing here is judged pass/fail: the report carries the raw overlap
    /// and distance numbers next to the signature a reviewer should expect
    /// for the pair's relationship kind.
    #[instrument(skip(self, cases), fields(cases = cases.len()))]
    pub async fn compare_pairs(&self, cases: &[PairCase], k: usize) -> RagbenchResult<PairReport> {
        check_batch_input(
            "pairs",
            k,
            cases
                .iter()
                .flat_map(|c| [c.query_a.as_str(), c.query_b.as_str()]),
        )?;

        let queries: Vec<&str> = cases
            .iter()
            .flat_map(|c| [c.query_a.as_str(), c.query_b.as_str()])
            .collect();
        let fetched = self.run_batch(&queries, k).await?;

        let per_case: Vec<PairCaseReport> = cases
            .iter()
            .zip(fetched.chunks_exact(2))
            .map(|(case, pair)| compare_one(case, &pair[0], &pair[1]))
            .collect();

        info!(k, pairs = per_case.len(), "Pair comparison complete");
        Ok(PairReport { k, per_case })
    }
}

fn compare_one(case: &PairCase, a: &Fetched, b: &Fetched) -> PairCaseReport {
    let (docs_a, docs_b) = (a.docs(), b.docs());
    let overlap = overlap_ids(docs_a, docs_b);
    let top1_a = docs_a.first().map(|d| d.distance);
    let top1_b = docs_b.first().map(|d| d.distance);
    let delta = match (top1_a, top1_b) {
        (Some(x), Some(y)) => Some((x - y).abs()),
        _ => None,
    };

    let status = match (a.status(), b.status()) {
        (CaseStatus::Scored, other) => other,
        (first, _) => first,
    };

    PairCaseReport {
        query_a: case.query_a.clone(),
        query_b: case.query_b.clone(),
        relationship_kind: case.relationship_kind,
        expected_signature: case.relationship_kind.expected_signature().to_string(),
        retrieved_a: docs_a.to_vec(),
        retrieved_b: docs_b.to_vec(),
        overlap_count: overlap.len(),
        overlap_ids: overlap,
        top1_distance_a: top1_a,
        top1_distance_b: top1_b,
        top1_distance_delta: delta,
        target_rank_a: case.target_id.as_deref().and_then(|t| rank_of(docs_a, t)),
        target_rank_b: case.target_id.as_deref().and_then(|t| rank_of(docs_b, t)),
        target_id: case.target_id.clone(),
        status,
    }
}

use tracing::{info, instrument};

use super::{
    check_batch_input, count_outcomes, DistanceStats, Fetched, RecallCase, RecallCaseReport,
    RecallReport, RetrievalHarness,
};
use crate::error::{RagbenchError, RagbenchResult};
use crate::retriever::Retriever;

impl<'r, R: Retriever + ?Sized> RetrievalHarness<'r, R> {
    /// Recall@K: the fraction of cases whose expected id appears anywhere in
    /// the top `k` results.
    ///
    /// A retriever returning fewer than `k` results is scored on what it
    /// returned. Timed-out and failed cases count as misses.
    #[instrument(skip(self, cases), fields(cases = cases.len()))]
    pub async fn evaluate_recall(&self, cases: &[RecallCase], k: usize) -> RagbenchResult<RecallReport> {
        check_batch_input("recall", k, cases.iter().map(|c| c.query.as_str()))?;
        if let Some(case) = cases.iter().find(|c| c.expected_id.trim().is_empty()) {
            return Err(RagbenchError::InvalidInput(format!(
                "recall: case '{}' has no expected id",
                case.query
            )));
        }

        let queries: Vec<&str> = cases.iter().map(|c| c.query.as_str()).collect();
        let fetched = self.run_batch(&queries, k).await?;

        let report = score_recall(cases, &fetched, k);
        info!(
            k,
            hits = report.hits,
            total = report.total_cases,
            score = report.score,
            "Recall evaluation complete"
        );
        Ok(report)
    }

    /// Recall@K for each `k` in `ks`, in the order given
    pub async fn recall_sweep(&self, cases: &[RecallCase], ks: &[usize]) -> RagbenchResult<Vec<RecallReport>> {
        if ks.is_empty() {
            return Err(RagbenchError::InvalidInput(
                "recall sweep: no k values supplied".to_string(),
            ));
        }
        let mut reports = Vec::with_capacity(ks.len());
        for &k in ks {
            reports.push(self.evaluate_recall(cases, k).await?);
        }
        Ok(reports)
    }
}

fn score_recall(cases: &[RecallCase], fetched: &[Fetched], k: usize) -> RecallReport {
    let per_case: Vec<RecallCaseReport> = cases
        .iter()
        .zip(fetched)
        .map(|(case, f)| {
            let docs = f.docs();
            let rank = docs
                .iter()
                .position(|d| d.id == case.expected_id)
                .map(|pos| pos + 1);
            RecallCaseReport {
                query: case.query.clone(),
                expected_id: case.expected_id.clone(),
                hit: rank.is_some(),
                rank,
                retrieved_ids: docs.iter().map(|d| d.id.clone()).collect(),
                distances: docs.iter().map(|d| d.distance).collect(),
                status: f.status(),
            }
        })
        .collect();

    let total_cases = per_case.len();
    let hits = per_case.iter().filter(|c| c.hit).count();
    let reciprocal_sum: f64 = per_case
        .iter()
        .filter_map(|c| c.rank)
        .map(|rank| 1.0 / rank as f64)
        .sum();
    let top1: Vec<f32> = per_case
        .iter()
        .filter_map(|c| c.distances.first().copied())
        .collect();
    let (timed_out, failed) = count_outcomes(fetched);

    RecallReport {
        k,
        total_cases,
        hits,
        score: hits as f64 / total_cases as f64,
        mrr: reciprocal_sum / total_cases as f64,
        timed_out,
        failed,
        distance_stats: DistanceStats::from_distances(&top1),
        per_case,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{CaseStatus, HarnessConfig, ScoredDoc};
    use crate::retriever::RecordedRetriever;

    fn scenario_retriever() -> RecordedRetriever {
        RecordedRetriever::new()
            .with(
                "What happened with the passenger who hit a flight attendant?",
                vec![
                    ScoredDoc::new("doc_1", 0.1),
                    ScoredDoc::new("doc_3590", 0.4),
                    ScoredDoc::new("doc_2146", 0.5),
                ],
            )
            .with(
                "Tell me about the new Ant-Man movie trailer.",
                vec![
                    ScoredDoc::new("doc_77", 0.3),
                    ScoredDoc::new("doc_8413", 0.35),
                ],
            )
    }

    #[tokio::test]
    async fn test_hit_within_top_k() {
        let retriever = scenario_retriever();
        let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());
        let cases = vec![RecallCase::new(
            "What happened with the passenger who hit a flight attendant?",
            "doc_1",
        )];

        let report = harness.evaluate_recall(&cases, 3).await.unwrap();
        assert_eq!(report.hits, 1);
        assert_eq!(report.score, 1.0);
        assert_eq!(report.summary(), "1 out of 1");
        assert_eq!(
            report.per_case[0].retrieved_ids,
            vec!["doc_1", "doc_3590", "doc_2146"]
        );
        assert_eq!(report.per_case[0].rank, Some(1));
    }

    #[tokio::test]
    async fn test_rank_and_mrr() {
        let retriever = scenario_retriever();
        let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());
        let cases = vec![
            RecallCase::new(
                "What happened with the passenger who hit a flight attendant?",
                "doc_1",
            ),
            RecallCase::new("Tell me about the new Ant-Man movie trailer.", "doc_8413"),
        ];

        let report = harness.evaluate_recall(&cases, 3).await.unwrap();
        assert_eq!(report.per_case[1].rank, Some(2));
        assert_eq!(report.mrr, 0.75);
        assert_eq!(report.per_case[1].status, CaseStatus::Scored);

        let stats = report.distance_stats.unwrap();
        assert_eq!(stats.count, 2);
    }

    #[tokio::test]
    async fn test_empty_expected_id_rejected() {
        let retriever = scenario_retriever();
        let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());
        let cases = vec![RecallCase::new("Tell me about the new Ant-Man movie trailer.", "")];

        let err = harness.evaluate_recall(&cases, 3).await.unwrap_err();
        assert!(matches!(err, RagbenchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_sweep_requires_ks() {
        let retriever = scenario_retriever();
        let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());
        let cases = vec![RecallCase::new("Tell me about the new Ant-Man movie trailer.", "doc_8413")];

        assert!(harness.recall_sweep(&cases, &[]).await.is_err());

        let reports = harness.recall_sweep(&cases, &[1, 2]).await.unwrap();
        assert_eq!(reports[0].hits, 0);
        assert_eq!(reports[1].hits, 1);
    }
}

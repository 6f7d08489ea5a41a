use tracing::{info, instrument};

use super::{
    check_batch_input, count_outcomes, DistanceStats, RetrievalHarness, ScoredDoc, ThresholdCase,
    ThresholdCaseReport, ThresholdReport,
};
use crate::error::{RagbenchError, RagbenchResult};
use crate::retriever::Retriever;

/// Split results into (accepted, rejected): accepted when
/// `distance < threshold`. Relative order inside each side is preserved.
pub fn partition_by_threshold(results: &[ScoredDoc], threshold: f32) -> (Vec<ScoredDoc>, Vec<ScoredDoc>) {
    results
        .iter()
        .cloned()
        .partition(|doc| doc.distance < threshold)
}

impl<'r, R: Retriever + ?Sized> RetrievalHarness<'r, R> {
    /// Fetch the top `k` for each probe query and split them at a distance
    /// cut-off.
    ///
    /// There is no default threshold: every case must carry its own or
    /// inherit `threshold`, otherwise the batch is rejected.
    #[instrument(skip(self, cases), fields(cases = cases.len()))]
    pub async fn filter_by_threshold(
        &self,
        cases: &[ThresholdCase],
        k: usize,
        threshold: Option<f32>,
    ) -> RagbenchResult<ThresholdReport> {
        check_batch_input("threshold", k, cases.iter().map(|c| c.query.as_str()))?;

        let mut thresholds = Vec::with_capacity(cases.len());
        for case in cases {
            let t = case.threshold.or(threshold).ok_or_else(|| {
                RagbenchError::InvalidInput(format!(
                    "threshold: no threshold supplied for query '{}'",
                    case.query
                ))
            })?;
            if !t.is_finite() {
                return Err(RagbenchError::InvalidInput(format!(
                    "threshold: {} is not a finite distance (query '{}')",
                    t, case.query
                )));
            }
            thresholds.push(t);
        }

        let queries: Vec<&str> = cases.iter().map(|c| c.query.as_str()).collect();
        let fetched = self.run_batch(&queries, k).await?;

        let per_case: Vec<ThresholdCaseReport> = cases
            .iter()
            .zip(&thresholds)
            .zip(&fetched)
            .map(|((case, &t), f)| {
                let (accepted, rejected) = partition_by_threshold(f.docs(), t);
                ThresholdCaseReport {
                    query: case.query.clone(),
                    threshold: t,
                    all_rejected: accepted.is_empty(),
                    accepted,
                    rejected,
                    status: f.status(),
                }
            })
            .collect();

        let top1: Vec<f32> = fetched
            .iter()
            .filter_map(|f| f.docs().first().map(|d| d.distance))
            .collect();
        let (timed_out, failed) = count_outcomes(&fetched);
        let no_match = per_case.iter().filter(|c| c.all_rejected).count();
        info!(k, no_match, total = per_case.len(), "Threshold analysis complete");

        Ok(ThresholdReport {
            threshold,
            k,
            timed_out,
            failed,
            distance_stats: DistanceStats::from_distances(&top1),
            per_case,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::HarnessConfig;
    use crate::retriever::RecordedRetriever;

    fn docs(pairs: &[(&str, f32)]) -> Vec<ScoredDoc> {
        pairs.iter().map(|(id, d)| ScoredDoc::new(*id, *d)).collect()
    }

    #[test]
    fn test_partition_boundary_is_rejected() {
        let results = docs(&[("a", 0.5), ("b", 0.75), ("c", 0.74)]);
        let (accepted, rejected) = partition_by_threshold(&results, 0.75);
        assert_eq!(accepted, docs(&[("a", 0.5), ("c", 0.74)]));
        assert_eq!(rejected, docs(&[("b", 0.75)]));
    }

    #[test]
    fn test_partition_is_idempotent_on_accepted() {
        let results = docs(&[("a", 0.1), ("b", 0.9), ("c", 0.3), ("d", 1.2)]);
        let (accepted, _) = partition_by_threshold(&results, 0.5);
        let (again, rejected_again) = partition_by_threshold(&accepted, 0.5);
        assert_eq!(again, accepted);
        assert!(rejected_again.is_empty());
    }

    #[tokio::test]
    async fn test_missing_threshold_rejected() {
        let retriever = RecordedRetriever::new().with("q", docs(&[("a", 0.1)]));
        let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());

        let err = harness
            .filter_by_threshold(&[ThresholdCase::new("q")], 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RagbenchError::InvalidInput(_)));

        let err = harness
            .filter_by_threshold(&[ThresholdCase::with_threshold("q", f32::NAN)], 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RagbenchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_case_threshold_overrides_batch() {
        let retriever = RecordedRetriever::new().with("q", docs(&[("a", 0.6), ("b", 0.9)]));
        let harness = RetrievalHarness::new(&retriever, HarnessConfig::default());

        let report = harness
            .filter_by_threshold(&[ThresholdCase::with_threshold("q", 1.0)], 5, Some(0.5))
            .await
            .unwrap();
        let case = &report.per_case[0];
        assert_eq!(case.threshold, 1.0);
        assert_eq!(case.accepted.len(), 2);
        assert_eq!(report.threshold, Some(0.5));
    }
}

//! Retrieval evaluation harness
//!
//! The harness drives an injected [`Retriever`] over a batch of cases and
//! scores the ranked results under one of three policies:
//! - **Recall@K**: does the golden document appear in the top K?
//! - **Distance threshold**: which results are close enough to trust?
//! - **Pair comparison**: how do two related queries' results differ?
//!
//! Cases are independent. Retrieval calls run concurrently up to
//! [`HarnessConfig::concurrency`], each under its own timeout, and outcomes are
//! folded in case order once the batch has finished so reports are
//! deterministic for a deterministic retriever.

mod qualitative;
mod recall;
mod stats;
mod threshold;
mod types;

pub use qualitative::overlap_ids;
pub use stats::DistanceStats;
pub use threshold::partition_by_threshold;
pub use types::*;

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{RagbenchError, RagbenchResult};
use crate::retriever::Retriever;

/// Limits applied to every batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Maximum retrieval calls in flight at once
    pub concurrency: usize,
    /// Per-call deadline in milliseconds
    pub timeout_ms: u64,
    /// Fraction of failed calls above which the batch is aborted
    pub max_failure_rate: f64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_ms: 30_000,
            max_failure_rate: 0.5,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> RagbenchResult<()> {
        if self.concurrency == 0 {
            return Err(RagbenchError::Configuration(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(RagbenchError::Configuration(
                "timeout_ms must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_failure_rate) {
            return Err(RagbenchError::Configuration(format!(
                "max_failure_rate must be within [0, 1], got {}",
                self.max_failure_rate
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Outcome of one retrieval call that did not abort the batch
#[derive(Debug)]
pub(crate) enum Fetched {
    Results(Vec<ScoredDoc>),
    /// A `RetrievalTimeout` or `RetrieverFailure` confined to its case
    Unscored(RagbenchError),
}

impl Fetched {
    /// Results for scoring; timeouts and failures score as empty
    pub(crate) fn docs(&self) -> &[ScoredDoc] {
        match self {
            Fetched::Results(docs) => docs,
            Fetched::Unscored(_) => &[],
        }
    }

    pub(crate) fn status(&self) -> CaseStatus {
        match self {
            Fetched::Results(_) => CaseStatus::Scored,
            Fetched::Unscored(RagbenchError::RetrievalTimeout { .. }) => CaseStatus::TimedOut,
            Fetched::Unscored(RagbenchError::RetrieverFailure { message, .. }) => CaseStatus::Failed {
                message: message.clone(),
            },
            Fetched::Unscored(other) => CaseStatus::Failed {
                message: other.to_string(),
            },
        }
    }
}

/// Per-status tallies over a batch's fetches
pub(crate) fn count_outcomes(fetched: &[Fetched]) -> (usize, usize) {
    fetched.iter().fold((0, 0), |(timed_out, failed), f| match f.status() {
        CaseStatus::Scored => (timed_out, failed),
        CaseStatus::TimedOut => (timed_out + 1, failed),
        CaseStatus::Failed { .. } => (timed_out, failed + 1),
    })
}

/// Evaluates a borrowed retriever.
///
/// The retriever (and whatever connection it holds) stays owned by the
/// caller for the whole batch; the harness only borrows it.
pub struct RetrievalHarness<'r, R: Retriever + ?Sized> {
    retriever: &'r R,
    config: HarnessConfig,
    cancel: CancellationToken,
}

impl<'r, R: Retriever + ?Sized> RetrievalHarness<'r, R> {
    pub fn new(retriever: &'r R, config: HarnessConfig) -> Self {
        Self {
            retriever,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation token; once cancelled no further retrieval
    /// calls are issued, while calls already in flight run to completion
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Issue one retrieval call per query and collect outcomes in query order.
    ///
    /// Batch-fatal conditions (malformed results, cancellation, excessive
    /// failures) are raised here once every dispatched call has settled.
    pub(crate) async fn run_batch(&self, queries: &[&str], k: usize) -> RagbenchResult<Vec<Fetched>> {
        self.config.validate()?;

        // Stops new dispatches on cancellation or a contract violation
        let stop = self.cancel.child_token();
        let total = queries.len();

        let outcomes: Vec<Option<RagbenchResult<Fetched>>> = stream::iter(queries.iter().copied())
            .map(|query| {
                let stop = stop.clone();
                async move {
                    if stop.is_cancelled() {
                        return None;
                    }
                    match self.fetch_one(query, k).await {
                        Ok(docs) => Some(Ok(Fetched::Results(docs))),
                        Err(e) if e.is_batch_fatal() => {
                            stop.cancel();
                            Some(Err(e))
                        }
                        Err(e) => Some(Ok(Fetched::Unscored(e))),
                    }
                }
            })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut fetched = Vec::with_capacity(total);
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                Some(Ok(f)) => fetched.push(f),
                Some(Err(e)) => return Err(e),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, total, "Batch cancelled before all cases were dispatched");
            return Err(RagbenchError::Cancelled {
                completed: fetched.len(),
                total,
            });
        }

        let (_, failed) = count_outcomes(&fetched);
        if failed > 0 && failed as f64 / total as f64 > self.config.max_failure_rate {
            return Err(RagbenchError::BatchAborted {
                failed,
                total,
                max_failure_rate: self.config.max_failure_rate,
            });
        }

        Ok(fetched)
    }

    /// One call under the per-call deadline. Timeouts and retriever errors
    /// come back as `RetrievalTimeout` / `RetrieverFailure`; a contract
    /// violation as `MalformedResult`.
    async fn fetch_one(&self, query: &str, k: usize) -> RagbenchResult<Vec<ScoredDoc>> {
        let deadline = self.config.timeout();
        match tokio::time::timeout(deadline, self.retriever.retrieve(query, k)).await {
            Err(_) => {
                warn!(query, timeout_ms = self.config.timeout_ms, "Retrieval timed out");
                Err(RagbenchError::RetrievalTimeout {
                    query: query.to_string(),
                    timeout_ms: self.config.timeout_ms,
                })
            }
            Ok(Err(e)) => {
                warn!(query, error = %e, "Retriever failed");
                Err(RagbenchError::RetrieverFailure {
                    query: query.to_string(),
                    message: format!("{:#}", e),
                })
            }
            Ok(Ok(results)) => {
                check_contract(query, k, &results)?;
                debug!(query, returned = results.len(), "Retrieved");
                Ok(results)
            }
        }
    }
}

/// Reject batch-level input problems before anything is dispatched
pub(crate) fn check_batch_input<'a>(
    mode: &str,
    k: usize,
    queries: impl IntoIterator<Item = &'a str>,
) -> RagbenchResult<()> {
    if k == 0 {
        return Err(RagbenchError::InvalidInput(format!(
            "{}: k must be a positive integer",
            mode
        )));
    }
    let mut count = 0;
    for (i, query) in queries.into_iter().enumerate() {
        if query.trim().is_empty() {
            return Err(RagbenchError::InvalidInput(format!(
                "{}: case {} has an empty query",
                mode,
                i + 1
            )));
        }
        count += 1;
    }
    if count == 0 {
        return Err(RagbenchError::InvalidInput(format!("{}: no cases supplied", mode)));
    }
    Ok(())
}

/// Verify a retriever honoured its contract; never repairs the result
pub(crate) fn check_contract(query: &str, k: usize, results: &[ScoredDoc]) -> RagbenchResult<()> {
    let malformed = |reason: String| RagbenchError::MalformedResult {
        query: query.to_string(),
        reason,
    };

    if results.len() > k {
        return Err(malformed(format!(
            "returned {} results for k = {}",
            results.len(),
            k
        )));
    }

    let mut seen = HashSet::with_capacity(results.len());
    let mut previous: Option<f32> = None;
    for (pos, doc) in results.iter().enumerate() {
        if !doc.distance.is_finite() || doc.distance < 0.0 {
            return Err(malformed(format!(
                "invalid distance {} for id '{}'",
                doc.distance, doc.id
            )));
        }
        if !seen.insert(doc.id.as_str()) {
            return Err(malformed(format!("duplicate id '{}'", doc.id)));
        }
        if let Some(prev) = previous {
            if doc.distance < prev {
                return Err(malformed(format!(
                    "not sorted by ascending distance at position {} ({} after {})",
                    pos + 1,
                    doc.distance,
                    prev
                )));
            }
        }
        previous = Some(doc.distance);
    }
    Ok(())
}

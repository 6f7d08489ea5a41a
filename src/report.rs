//! Human-readable and JSON rendering of score reports

use std::fmt;

use serde::Serialize;

use crate::corpus::Corpus;
use crate::error::RagbenchResult;
use crate::harness::{CaseStatus, PairReport, RecallReport, ScoredDoc, ThresholdReport};

const RULE: &str = "======================================================================";

/// Pretty-printed JSON for any report
pub fn to_json<T: Serialize>(report: &T) -> RagbenchResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn status_note(status: &CaseStatus) -> Option<String> {
    match status {
        CaseStatus::Scored => None,
        CaseStatus::TimedOut => Some("retrieval timed out".to_string()),
        CaseStatus::Failed { message } => Some(format!("retriever failed: {}", message)),
    }
}

fn headline_suffix(corpus: Option<&Corpus>, id: &str) -> String {
    corpus
        .and_then(|c| c.headline(id))
        .map(|h| format!(" | '{}'", h))
        .unwrap_or_default()
}

/// Text form of a [`RecallReport`]
pub fn render_recall(report: &RecallReport) -> String {
    RecallText(report).to_string()
}

/// Text form of a [`ThresholdReport`]; headlines are shown when a corpus is given
pub fn render_threshold(report: &ThresholdReport, corpus: Option<&Corpus>) -> String {
    ThresholdText { report, corpus }.to_string()
}

/// Text form of a [`PairReport`]; headlines are shown when a corpus is given
pub fn render_pairs(report: &PairReport, corpus: Option<&Corpus>) -> String {
    PairText { report, corpus }.to_string()
}

struct RecallText<'a>(&'a RecallReport);

impl fmt::Display for RecallText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "--- Recall @ {} Evaluation ({} Queries) ---",
            report.k, report.total_cases
        )?;

        for (i, case) in report.per_case.iter().enumerate() {
            let status = if case.hit { "MATCH" } else { "FAIL" };
            writeln!(
                f,
                "[{}/{}] {}: Query: '{}'",
                i + 1,
                report.total_cases,
                status,
                case.query
            )?;
            writeln!(
                f,
                "      Expected ID: {} | Top {} Retrieved IDs: {:?}",
                case.expected_id, report.k, case.retrieved_ids
            )?;
            if let Some(note) = status_note(&case.status) {
                writeln!(f, "      Note: {}", note)?;
            }
        }

        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "FINAL RESULT: Recall @ {} Score: {:.2} ({} correct)",
            report.k,
            report.score,
            report.summary()
        )?;
        writeln!(f, "MRR: {:.3}", report.mrr)?;
        if report.timed_out > 0 || report.failed > 0 {
            writeln!(
                f,
                "Degraded run: {} timed out, {} failed",
                report.timed_out, report.failed
            )?;
        }
        if let Some(stats) = &report.distance_stats {
            writeln!(
                f,
                "Top-1 distance: mean {:.4}, median {:.4}, min {:.4}, max {:.4}",
                stats.mean, stats.median, stats.min, stats.max
            )?;
        }
        writeln!(f, "{}", RULE)
    }
}

fn write_docs(
    f: &mut fmt::Formatter<'_>,
    marker: &str,
    docs: &[ScoredDoc],
    corpus: Option<&Corpus>,
) -> fmt::Result {
    for doc in docs {
        writeln!(
            f,
            "    {} (Distance: {:.4}) {}{}",
            marker,
            doc.distance,
            doc.id,
            headline_suffix(corpus, &doc.id)
        )?;
    }
    Ok(())
}

struct ThresholdText<'a> {
    report: &'a ThresholdReport,
    corpus: Option<&'a Corpus>,
}

impl fmt::Display for ThresholdText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.report.threshold {
            Some(t) => writeln!(f, "--- Distance Threshold Analysis (Threshold: < {:.2}) ---", t)?,
            None => writeln!(f, "--- Distance Threshold Analysis (per-query thresholds) ---")?,
        }

        for (i, case) in self.report.per_case.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "[{}] Query: '{}'", i + 1, case.query)?;
            write_docs(f, "ACCEPTED", &case.accepted, self.corpus)?;
            write_docs(f, "REJECTED", &case.rejected, self.corpus)?;
            if let Some(note) = status_note(&case.status) {
                writeln!(f, "    Note: {}", note)?;
            } else if case.all_rejected {
                writeln!(
                    f,
                    "    Note: No documents were found below the {:.2} threshold.",
                    case.threshold
                )?;
            }
        }
        Ok(())
    }
}

struct PairText<'a> {
    report: &'a PairReport,
    corpus: Option<&'a Corpus>,
}

impl fmt::Display for PairText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Qualitative Semantic Robustness (Top {}, manual review required) ---",
            self.report.k
        )?;

        for case in &self.report.per_case {
            writeln!(f)?;
            writeln!(f, "{}", RULE)?;
            writeln!(f, "TEST TYPE: {}", case.relationship_kind)?;

            for (label, query, docs) in [
                ("A", &case.query_a, &case.retrieved_a),
                ("B", &case.query_b, &case.retrieved_b),
            ] {
                writeln!(f, "  Query {}: '{}'", label, query)?;
                for (j, doc) in docs.iter().enumerate() {
                    let target = match &case.target_id {
                        Some(t) if *t == doc.id => " TARGET",
                        _ => "",
                    };
                    writeln!(
                        f,
                        "    [Top {}] ID: {} | Dist: {:.4}{}{}",
                        j + 1,
                        doc.id,
                        doc.distance,
                        target,
                        headline_suffix(self.corpus, &doc.id)
                    )?;
                }
            }

            writeln!(f, "  Overlap: {} {:?}", case.overlap_count, case.overlap_ids)?;
            match case.top1_distance_delta {
                Some(delta) => writeln!(f, "  Top-1 distance delta: {:.4}", delta)?,
                None => writeln!(f, "  Top-1 distance delta: n/a (a query returned nothing)")?,
            }
            if let Some(note) = status_note(&case.status) {
                writeln!(f, "  Note: {}", note)?;
            }
            writeln!(f, ">> EXPECTED SIGNATURE: {}", case.expected_signature)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{RecallCaseReport, ThresholdCaseReport};

    fn recall_report() -> RecallReport {
        RecallReport {
            k: 3,
            total_cases: 2,
            hits: 1,
            score: 0.5,
            mrr: 0.5,
            timed_out: 1,
            failed: 0,
            distance_stats: None,
            per_case: vec![
                RecallCaseReport {
                    query: "covid".to_string(),
                    expected_id: "doc_0".to_string(),
                    hit: true,
                    rank: Some(1),
                    retrieved_ids: vec!["doc_0".to_string()],
                    distances: vec![0.4],
                    status: CaseStatus::Scored,
                },
                RecallCaseReport {
                    query: "ant-man".to_string(),
                    expected_id: "doc_8413".to_string(),
                    hit: false,
                    rank: None,
                    retrieved_ids: vec![],
                    distances: vec![],
                    status: CaseStatus::TimedOut,
                },
            ],
        }
    }

    #[test]
    fn test_recall_text_summary() {
        let text = render_recall(&recall_report());
        assert!(text.contains("[1/2] MATCH: Query: 'covid'"));
        assert!(text.contains("[2/2] FAIL: Query: 'ant-man'"));
        assert!(text.contains("Recall @ 3 Score: 0.50 (1 out of 2 correct)"));
        assert!(text.contains("retrieval timed out"));
    }

    #[test]
    fn test_recall_json_shape() {
        let json = to_json(&recall_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["hits"], 1);
        assert_eq!(value["per_case"][1]["status"]["kind"], "timed_out");
        assert_eq!(value["per_case"][0]["retrieved_ids"][0], "doc_0");
    }

    #[test]
    fn test_threshold_notes_empty_match() {
        let report = ThresholdReport {
            threshold: Some(0.75),
            k: 5,
            timed_out: 0,
            failed: 0,
            distance_stats: None,
            per_case: vec![ThresholdCaseReport {
                query: "something this week".to_string(),
                threshold: 0.75,
                accepted: vec![],
                rejected: vec![ScoredDoc::new("x", 1.16)],
                all_rejected: true,
                status: CaseStatus::Scored,
            }],
        };
        let text = render_threshold(&report, None);
        assert!(text.contains("REJECTED (Distance: 1.1600) x"));
        assert!(text.contains("No documents were found below the 0.75 threshold."));
    }

    #[test]
    fn test_pairs_text_marks_target_and_missing_delta() {
        use crate::harness::{PairCaseReport, RelationshipKind};

        let report = PairReport {
            k: 2,
            per_case: vec![PairCaseReport {
                query_a: "airline passenger banned".to_string(),
                query_b: "airline passenger praised".to_string(),
                relationship_kind: RelationshipKind::Foil,
                expected_signature: RelationshipKind::Foil.expected_signature().to_string(),
                retrieved_a: vec![ScoredDoc::new("doc_1", 0.3)],
                retrieved_b: vec![],
                overlap_ids: vec![],
                overlap_count: 0,
                top1_distance_a: Some(0.3),
                top1_distance_b: None,
                top1_distance_delta: None,
                target_id: Some("doc_1".to_string()),
                target_rank_a: Some(1),
                target_rank_b: None,
                status: CaseStatus::TimedOut,
            }],
        };
        let text = render_pairs(&report, None);
        assert!(text.contains("TEST TYPE: foil"));
        assert!(text.contains("[Top 1] ID: doc_1 | Dist: 0.3000 TARGET"));
        assert!(text.contains("Top-1 distance delta: n/a"));
        assert!(text.contains("Note: retrieval timed out"));
        assert!(text.contains(">> EXPECTED SIGNATURE: near-zero overlap"));
    }
}

//! Loading evaluation cases from disk, plus the built-in demo sets
//!
//! Case files are either a JSON array or JSON Lines of the case type:
//!
//! ```json
//! [{"query": "Tell me about the new Ant-Man movie trailer.", "expected_id": "doc_8413"}]
//! ```

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::{RagbenchError, RagbenchResult};
use crate::harness::{PairCase, RecallCase, RelationshipKind, ThresholdCase};

fn doc_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^doc_\d+$").expect("static doc id pattern"))
}

/// Whether `id` is in the `doc_<index>` space produced by subset construction
pub fn is_subset_doc_id(id: &str) -> bool {
    doc_id_pattern().is_match(id)
}

/// Parse a JSON array, or failing that, JSON Lines.
///
/// Shared by every on-disk record format: case files, the raw dataset and
/// written subsets. Blank lines between records are ignored.
pub fn parse_records<T: DeserializeOwned>(text: &str) -> RagbenchResult<Vec<T>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }

    serde_json::Deserializer::from_str(text)
        .into_iter::<T>()
        .map(|record| {
            record.map_err(|e| RagbenchError::Serialization(format!("line {}: {}", e.line(), e)))
        })
        .collect()
}

fn load_records<T: DeserializeOwned>(path: &Path) -> RagbenchResult<Vec<T>> {
    let text = std::fs::read_to_string(path)?;
    parse_records(&text).map_err(|e| match e {
        RagbenchError::Serialization(msg) => {
            RagbenchError::Serialization(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Check every golden case points into the subset id space
pub fn validate_golden_set(cases: &[RecallCase]) -> RagbenchResult<()> {
    for case in cases {
        if !is_subset_doc_id(&case.expected_id) {
            return Err(RagbenchError::InvalidInput(format!(
                "expected id '{}' for query '{}' is not of the form doc_<index>",
                case.expected_id, case.query
            )));
        }
    }
    Ok(())
}

/// Load and validate a golden set of `{query, expected_id}` records
pub fn load_golden_set<P: AsRef<Path>>(path: P) -> RagbenchResult<Vec<RecallCase>> {
    let cases = load_records(path.as_ref())?;
    validate_golden_set(&cases)?;
    Ok(cases)
}

/// Load `{query, threshold?}` probe records
pub fn load_threshold_cases<P: AsRef<Path>>(path: P) -> RagbenchResult<Vec<ThresholdCase>> {
    load_records(path.as_ref())
}

/// Load `{query_a, query_b, relationship_kind, target_id?}` records
pub fn load_pair_cases<P: AsRef<Path>>(path: P) -> RagbenchResult<Vec<PairCase>> {
    load_records(path.as_ref())
}

/// Hand-curated golden set for the news subset
pub fn builtin_golden_set() -> Vec<RecallCase> {
    vec![
        RecallCase::new("News about the latest COVID-19 vaccination rates.", "doc_0"),
        RecallCase::new(
            "What happened with the passenger who hit a flight attendant?",
            "doc_1",
        ),
        RecallCase::new(
            "Political scandal involving a candidate and a Super PAC ad.",
            "doc_8412",
        ),
        RecallCase::new("Tell me about the new Ant-Man movie trailer.", "doc_8413"),
    ]
}

/// Probe queries: a clear match, a vague one, and a mid-range one
pub fn builtin_threshold_cases() -> Vec<ThresholdCase> {
    vec![
        ThresholdCase::new("New update on the latest COVID booster shots"),
        ThresholdCase::new("Something interesting that happened this week"),
        ThresholdCase::new("Action movie trailers released this year"),
    ]
}

/// Robustness pairs for manual review
pub fn builtin_pair_cases() -> Vec<PairCase> {
    vec![
        PairCase::new(
            "What kind of funny tweets were posted about pets recently?",
            "Best tweets about cats and dogs this past week.",
            RelationshipKind::Synonymy,
        )
        .with_target("doc_2")
        .with_description("Two phrasings of the same request should land on the same headlines"),
        PairCase::new(
            "News about the government official's political salary reduction.",
            "An article discussing high compensation for corporate executives.",
            RelationshipKind::Polysemy,
        )
        .with_target("doc_8411")
        .with_description("'Pay' in a political versus a corporate context"),
        PairCase::new(
            "Airline passenger banned after assaulting a flight attendant",
            "Airline passenger praised after assisting a flight attendant",
            RelationshipKind::Foil,
        )
        .with_target("doc_1")
        .with_description("One changed verb flips the story"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_pattern() {
        assert!(is_subset_doc_id("doc_0"));
        assert!(is_subset_doc_id("doc_8413"));
        assert!(!is_subset_doc_id("doc_"));
        assert!(!is_subset_doc_id("None"));
        assert!(!is_subset_doc_id("doc_12a"));
    }

    #[test]
    fn test_parse_array_and_lines() {
        let array = r#"[{"query": "q1", "expected_id": "doc_1"}]"#;
        let cases: Vec<RecallCase> = parse_records(array).unwrap();
        assert_eq!(cases, vec![RecallCase::new("q1", "doc_1")]);

        let lines = "{\"query\": \"q1\", \"expected_id\": \"doc_1\"}\n\n{\"query\": \"q2\", \"expected_id\": \"doc_2\"}\n";
        let cases: Vec<RecallCase> = parse_records(lines).unwrap();
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let lines = "{\"query\": \"q1\", \"expected_id\": \"doc_1\"}\n{\"query\": 5}\n";
        let err = parse_records::<RecallCase>(lines).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_pair_case_kind_parses() {
        let json = r#"[{"query_a": "a", "query_b": "b", "relationship_kind": "foil"}]"#;
        let cases: Vec<PairCase> = parse_records(json).unwrap();
        assert_eq!(cases[0].relationship_kind, RelationshipKind::Foil);
        assert!(cases[0].target_id.is_none());
    }

    #[test]
    fn test_builtin_golden_set_is_valid() {
        assert!(validate_golden_set(&builtin_golden_set()).is_ok());
        let bad = vec![RecallCase::new("q", "headline-7")];
        assert!(matches!(
            validate_golden_set(&bad),
            Err(RagbenchError::InvalidInput(_))
        ));
    }
}

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::cases::parse_records;
use super::Document;

/// How many leading records are considered when picking categories
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

/// How many of the most frequent categories make it into the subset
pub const DEFAULT_CATEGORY_COUNT: usize = 8;

/// One line of the News Category dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub headline: String,
    pub category: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Read a JSON Lines file with the same parser as case files
fn read_jsonl<T, P>(path: P) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let records = parse_records(&text)
        .with_context(|| format!("Invalid records in '{}'", path.display()))?;
    Ok(records)
}

/// Load the raw News Category dataset
pub fn load_news_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<NewsRecord>> {
    let records = read_jsonl(&path)?;
    info!("Loaded {} records from '{}'", records.len(), path.as_ref().display());
    Ok(records)
}

/// Most frequent categories among `records`; ties keep first-appearance order
fn top_categories(records: &[NewsRecord], category_count: usize) -> Vec<&str> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, record) in records.iter().enumerate() {
        counts.entry(record.category.as_str()).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(cat, (count, first))| (cat, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(category_count)
        .map(|(cat, _, _)| cat)
        .collect()
}

/// Build the evaluation subset.
///
/// Looks at the first `max_records` records, keeps those belonging to the
/// `category_count` most frequent categories (in source order), and numbers
/// them `doc_0`, `doc_1`, ...
pub fn build_subset(records: &[NewsRecord], max_records: usize, category_count: usize) -> Vec<Document> {
    let head = &records[..records.len().min(max_records)];
    let selected: HashSet<&str> = top_categories(head, category_count).into_iter().collect();

    head.iter()
        .filter(|r| selected.contains(r.category.as_str()))
        .enumerate()
        .map(|(i, r)| Document {
            id: format!("doc_{}", i),
            headline: r.headline.clone(),
            category: r.category.clone(),
        })
        .collect()
}

/// Write documents as JSON Lines, creating parent directories
pub fn write_subset<P: AsRef<Path>>(path: P, documents: &[Document]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    for doc in documents {
        serde_json::to_writer(&mut writer, doc).context("Failed to serialize document")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!("Saved {} documents to '{}'", documents.len(), path.display());
    Ok(())
}

/// Load a subset written by [`write_subset`]
pub fn load_subset<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    read_jsonl(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(headline: &str, category: &str) -> NewsRecord {
        NewsRecord {
            headline: headline.to_string(),
            category: category.to_string(),
            short_description: None,
            authors: None,
            link: None,
            date: None,
        }
    }

    #[test]
    fn test_top_categories_by_frequency() {
        let records = vec![
            record("a", "POLITICS"),
            record("b", "COMEDY"),
            record("c", "POLITICS"),
            record("d", "SPORTS"),
            record("e", "COMEDY"),
            record("f", "POLITICS"),
        ];
        assert_eq!(top_categories(&records, 2), vec!["POLITICS", "COMEDY"]);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let records = vec![record("a", "WELLNESS"), record("b", "TRAVEL"), record("c", "STYLE")];
        assert_eq!(top_categories(&records, 2), vec!["WELLNESS", "TRAVEL"]);
    }

    #[test]
    fn test_subset_ids_are_sequential_in_source_order() {
        let records = vec![
            record("covid boosters", "U.S. NEWS"),
            record("rare bird", "ENVIRONMENT"),
            record("flyer banned", "U.S. NEWS"),
            record("pac ad", "POLITICS"),
            record("salary cut", "POLITICS"),
        ];

        let docs = build_subset(&records, 10, 2);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        let headlines: Vec<&str> = docs.iter().map(|d| d.headline.as_str()).collect();
        assert_eq!(ids, vec!["doc_0", "doc_1", "doc_2", "doc_3"]);
        assert_eq!(headlines, vec!["covid boosters", "flyer banned", "pac ad", "salary cut"]);
    }

    #[test]
    fn test_subset_file_round_trip_and_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subset.json");
        let docs = build_subset(&[record("covid boosters", "U.S. NEWS")], 10, 8);
        write_subset(&path, &docs).unwrap();
        assert_eq!(load_subset(&path).unwrap(), docs);

        let raw = dir.path().join("news.json");
        std::fs::write(
            &raw,
            "{\"headline\": \"a\", \"category\": \"POLITICS\"}\n\n{\"headline\": 3}\n",
        )
        .unwrap();
        let err = load_news_jsonl(&raw).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_subset_respects_max_records() {
        let records = vec![
            record("a", "POLITICS"),
            record("b", "POLITICS"),
            record("c", "POLITICS"),
        ];
        assert_eq!(build_subset(&records, 2, 8).len(), 2);
        assert!(build_subset(&[], 10, 8).is_empty());
    }
}

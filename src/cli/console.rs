use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::corpus::Corpus;
use crate::retriever::Retriever;

/// Interactive headline search on stdin/stdout
pub async fn run<R: Retriever + ?Sized>(retriever: &R, corpus: &Corpus, k: usize) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_io(retriever, corpus, k, stdin.lock(), stdout.lock()).await
}

/// Console loop over arbitrary input/output.
///
/// Each non-empty line is a query; `quit` or `exit` leaves. `:k <n>` changes
/// how many results are shown.
pub async fn run_with_io<R, I, O>(
    retriever: &R,
    corpus: &Corpus,
    k: usize,
    mut input: I,
    mut output: O,
) -> Result<()>
where
    R: Retriever + ?Sized,
    I: BufRead,
    O: Write,
{
    let mut k = k.max(1);

    writeln!(output, "{}", "=".repeat(100))?;
    writeln!(output, "Semantic search ready over {} headlines.", corpus.len())?;
    writeln!(output, "{}", "=".repeat(100))?;

    loop {
        write!(output, "\nEnter your search query (e.g., 'cricket game news' or 'quit'): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();

        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        if let Some(arg) = query.strip_prefix(":k") {
            match arg.trim().parse::<usize>() {
                Ok(n) if n > 0 => {
                    k = n;
                    writeln!(output, "Showing top {} results.", k)?;
                }
                _ => writeln!(output, "Usage: :k <positive number>")?,
            }
            continue;
        }

        writeln!(output, "Searching for: '{}'...", query)?;
        match retriever.retrieve(query, k).await {
            Ok(results) if results.is_empty() => writeln!(output, "No relevant headlines found.")?,
            Ok(results) => {
                writeln!(output, "\n--- Top {} Most Relevant Headlines (by Vector Similarity) ---", k)?;
                for (i, doc) in results.iter().enumerate() {
                    let headline = corpus.headline(&doc.id).unwrap_or("<unknown document>");
                    writeln!(
                        output,
                        "[{}] Similarity (Distance): {:.4} | Headline: '{}'",
                        i + 1,
                        doc.distance,
                        headline
                    )?;
                }
            }
            Err(e) => writeln!(output, "Error: {}", e)?,
        }
    }

    writeln!(output, "Exiting search. Goodbye!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use crate::harness::ScoredDoc;
    use crate::retriever::RecordedRetriever;

    fn corpus() -> Corpus {
        Corpus::new(vec![Document {
            id: "doc_2".to_string(),
            headline: "23 Of The Funniest Tweets About Cats And Dogs This Week".to_string(),
            category: "COMEDY".to_string(),
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_then_quit() {
        let retriever =
            RecordedRetriever::new().with("funny pets", vec![ScoredDoc::new("doc_2", 0.52)]);
        let input = io::Cursor::new("funny pets\n\nquit\nignored\n");
        let mut output = Vec::new();

        run_with_io(&retriever, &corpus(), 3, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("[1] Similarity (Distance): 0.5200 | Headline: '23 Of The Funniest"));
        assert!(text.contains("Goodbye"));
        assert!(!text.contains("ignored"));
    }

    #[tokio::test]
    async fn test_retriever_error_keeps_console_alive() {
        let retriever = RecordedRetriever::new();
        let input = io::Cursor::new(":k 0\n:k 5\nunknown query\n");
        let mut output = Vec::new();

        run_with_io(&retriever, &corpus(), 3, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Usage: :k"));
        assert!(text.contains("Showing top 5 results."));
        assert!(text.contains("Error: no recorded results"));
    }
}

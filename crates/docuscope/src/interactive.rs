//! Terminal front end: file prompt, question loop, batch analysis

use console::style;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::DocumentIngestor;
use crate::session::Session;
use crate::types::{is_exit_command, Answer, DocumentSummary, Source};

/// Sources printed under an answer
pub const MAX_DISPLAYED_SOURCES: usize = 3;

/// Characters of each source snippet printed under an answer
pub const SNIPPET_CHARS: usize = 200;

/// Questions asked of every document when no question file is given
pub const STANDARD_QUESTIONS: &[&str] = &[
    "What is the total value or sum?",
    "What are the top 5 items?",
    "Summarize the main findings in one sentence",
    "Are there any trends or patterns?",
    "What metrics or numbers are mentioned?",
];

/// Strip surrounding whitespace and one pair of matching quotes, as left
/// behind by drag-and-drop into a terminal
pub fn strip_quotes(input: &str) -> &str {
    let trimmed = input.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Ask for a document path until a valid one is entered. Returns `None` on
/// end of input or an exit word.
pub fn prompt_for_path<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<PathBuf>> {
    loop {
        write!(output, "{} ", style("Enter the path to a CSV or PDF file:").cyan())?;
        output.flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        let entered = strip_quotes(&line);
        if entered.is_empty() {
            continue;
        }
        if is_exit_command(entered) {
            return Ok(None);
        }

        let path = PathBuf::from(entered);
        match DocumentIngestor::validate(&path) {
            Ok(_) => return Ok(Some(path)),
            Err(e) => writeln!(output, "{} {}", style("✗").red(), e)?,
        }
    }
}

/// Render an answer followed by its distinct source snippets
pub fn format_answer(answer: &Answer) -> String {
    let mut out = format!("{}\n{}\n", style("Answer:").green().bold(), answer.answer_text);

    let sources = answer.distinct_sources();
    if !sources.is_empty() {
        out.push_str(&format!("\n{}\n", style("Sources:").bold()));
        for (i, source) in sources.iter().take(MAX_DISPLAYED_SOURCES).enumerate() {
            out.push_str(&format!(
                "  {}. {} {}\n",
                i + 1,
                style(source.format_inline()).dim(),
                source.snippet(SNIPPET_CHARS).replace('\n', " | ")
            ));
        }
    }

    out
}

/// Render a document summary line
pub fn format_summary(summary: &DocumentSummary) -> String {
    let mut line = format!(
        "{} {} ({}, {} bytes): {} chunks",
        style("✓").green(),
        summary.filename,
        summary.file_type.display_name(),
        summary.file_size,
        summary.total_chunks
    );
    if !summary.skipped_pages.is_empty() {
        line.push_str(&format!(
            ", skipped pages {:?}",
            summary.skipped_pages
        ));
    }
    line
}

/// Outcome of an interactive question loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChatStats {
    /// Questions answered
    pub answered: usize,
    /// Questions that failed or were cancelled
    pub failed: usize,
}

/// Read questions until an exit word or end of input, printing answers.
/// Ctrl-C cancels the question in flight and returns to the prompt.
pub async fn run_chat<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    output: &mut W,
) -> Result<ChatStats> {
    let mut stats = ChatStats::default();

    loop {
        write!(output, "\n{} ", style("Question:").cyan().bold())?;
        output.flush()?;

        let Some(line) = read_line(input)? else {
            writeln!(output)?;
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            break;
        }

        let outcome = tokio::select! {
            result = session.ask(question) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(Ok(answer)) => {
                stats.answered += 1;
                write!(output, "\n{}", format_answer(&answer))?;
            }
            Some(Err(e)) => {
                stats.failed += 1;
                tracing::debug!("Question failed: {}", e);
                writeln!(output, "{} {}", style("✗").red(), e)?;
            }
            None => {
                stats.failed += 1;
                writeln!(output, "\n{}", style("Question cancelled").yellow())?;
            }
        }
    }

    writeln!(output, "{}", style("Goodbye!").bold())?;
    Ok(stats)
}

/// Read a question list: one per line, blank lines and `#` comments ignored
pub fn read_questions(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::unreadable(path, e.to_string()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Result of one question in a batch run
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    /// Answer text, absent on failure
    pub answer: Option<String>,
    /// Source references of the chunks the answer used
    pub sources: Vec<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Results for one document in a batch run
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// Document path as given
    pub document: String,
    /// `(question, result)` in question order
    pub answers: Vec<(String, QuestionResult)>,
}

impl DocumentReport {
    /// Questions answered without error
    pub fn successful(&self) -> usize {
        self.answers.iter().filter(|(_, r)| r.error.is_none()).count()
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Documents that loaded, in input order
    pub documents: Vec<DocumentReport>,
    /// `(document, error)` for documents that failed to load
    pub load_failures: Vec<(String, String)>,
}

impl BatchReport {
    /// JSON of the form `{document: {question: {answer, sources, error?}}}`,
    /// keeping input order
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut root = serde_json::Map::new();
        for doc in &self.documents {
            let mut questions = serde_json::Map::new();
            for (question, result) in &doc.answers {
                questions.insert(question.clone(), serde_json::to_value(result)?);
            }
            root.insert(doc.document.clone(), serde_json::Value::Object(questions));
        }
        Ok(serde_json::Value::Object(root))
    }
}

/// Ask every question of every document with one session. Load and
/// question failures are recorded, never fatal.
pub async fn run_batch<W: Write>(
    session: &mut Session,
    documents: &[PathBuf],
    questions: &[String],
    output: &mut W,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for path in documents {
        let name = path.display().to_string();
        writeln!(output, "\n{} {}", style("Processing").bold(), name)?;

        if let Err(e) = session.load_document(path).await {
            tracing::warn!("Skipping {}: {}", name, e);
            writeln!(output, "  {} {}", style("✗").red(), e)?;
            report.load_failures.push((name, e.to_string()));
            continue;
        }

        let mut doc = DocumentReport {
            document: name.clone(),
            answers: Vec::with_capacity(questions.len()),
        };

        for question in questions {
            writeln!(output, "  {} {}", style("?").cyan(), question)?;
            let result = match session.ask(question).await {
                Ok(answer) => QuestionResult {
                    answer: Some(answer.answer_text.clone()),
                    sources: answer.sources.iter().map(Source::reference).collect(),
                    error: None,
                },
                Err(e) => {
                    writeln!(output, "    {} {}", style("✗").red(), e)?;
                    QuestionResult {
                        answer: None,
                        sources: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            doc.answers.push((question.clone(), result));
        }

        writeln!(output, "  {} {}", style("✓").green(), name)?;
        report.documents.push(doc);
    }

    writeln!(output, "\n{}", style("Summary:").bold())?;
    for doc in &report.documents {
        writeln!(
            output,
            "  {}: {}/{} successful",
            doc.document,
            doc.successful(),
            questions.len()
        )?;
    }
    for (document, error) in &report.load_failures {
        writeln!(output, "  {}: not loaded ({})", document, error)?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::SearchResult;
    use crate::types::{Chunk, ChunkSource, FileType};
    use std::io::Cursor;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("  \"/tmp/my file.csv\"\n"), "/tmp/my file.csv");
        assert_eq!(strip_quotes("'/tmp/a.pdf'"), "/tmp/a.pdf");
        assert_eq!(strip_quotes("\"unbalanced.csv"), "\"unbalanced.csv");
        assert_eq!(strip_quotes("plain.csv"), "plain.csv");
    }

    #[test]
    fn test_prompt_for_path_retries_until_valid() {
        console::set_colors_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("data.csv");
        std::fs::write(&good, "a\n1\n").unwrap();

        let script = format!("\nmissing.csv\n\"{}\"\n", good.display());
        let mut input = Cursor::new(script.into_bytes());
        let mut output = Vec::new();

        let path = prompt_for_path(&mut input, &mut output).unwrap();
        assert_eq!(path, Some(good));
        assert!(String::from_utf8(output).unwrap().contains("File not found"));
    }

    #[test]
    fn test_prompt_for_path_eof() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        assert_eq!(prompt_for_path(&mut input, &mut output).unwrap(), None);

        let mut input = Cursor::new(b"quit\n".to_vec());
        assert_eq!(prompt_for_path(&mut input, &mut output).unwrap(), None);
    }

    #[test]
    fn test_format_answer_dedups_and_truncates() {
        console::set_colors_enabled(false);
        let long = "x".repeat(300);
        let results: Vec<SearchResult> = [long.as_str(), long.as_str(), "tiny", "name: B\nvalue: 2"]
            .iter()
            .enumerate()
            .map(|(i, text)| SearchResult {
                chunk: Chunk::new(
                    text.to_string(),
                    ChunkSource::new("t.csv", FileType::Csv, i as u32 + 1),
                ),
                similarity: 0.5,
            })
            .collect();
        let answer = Answer::new("B is 2".to_string(), &results, 3);

        let text = format_answer(&answer);
        assert!(text.starts_with("Answer:\nB is 2\n"));
        assert!(text.contains(&format!("  1. [Source: t.csv, Row 1] {}...", "x".repeat(200))));
        assert!(text.contains("  2. [Source: t.csv, Row 4] name: B | value: 2"));
        assert!(!text.contains("  3."));
    }

    #[test]
    fn test_batch_json_keeps_input_order() {
        let ok = QuestionResult {
            answer: Some("42".to_string()),
            sources: vec!["b.csv, Row 1".to_string()],
            error: None,
        };
        let failed = QuestionResult {
            answer: None,
            sources: Vec::new(),
            error: Some("Generation service unavailable: timeout".to_string()),
        };
        let report = BatchReport {
            documents: vec![
                DocumentReport {
                    document: "z.csv".to_string(),
                    answers: vec![("Second?".to_string(), ok.clone()), ("First?".to_string(), failed)],
                },
                DocumentReport {
                    document: "a.pdf".to_string(),
                    answers: vec![("Only?".to_string(), ok)],
                },
            ],
            load_failures: vec![("missing.csv".to_string(), "File not found".to_string())],
        };

        let json = report.to_json().unwrap();
        let root = json.as_object().unwrap();
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["z.csv", "a.pdf"]);

        let z = root["z.csv"].as_object().unwrap();
        assert_eq!(z.keys().collect::<Vec<_>>(), vec!["Second?", "First?"]);
        assert_eq!(z["Second?"]["answer"], "42");
        assert!(z["Second?"].get("error").is_none());
        assert!(z["First?"]["answer"].is_null());
        assert_eq!(z["First?"]["error"], "Generation service unavailable: timeout");
        assert_eq!(report.documents[0].successful(), 1);
    }

    #[test]
    fn test_read_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.txt");
        std::fs::write(&path, "# header\nWhat is the total?\n\n  Top items?  \n").unwrap();

        assert_eq!(
            read_questions(&path).unwrap(),
            vec!["What is the total?".to_string(), "Top items?".to_string()]
        );
    }
}

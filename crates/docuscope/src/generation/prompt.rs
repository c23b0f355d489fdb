//! Prompt templates for RAG generation

use crate::retrieval::SearchResult;

/// Context entries shorter than this after truncation are dropped instead
const MIN_TRUNCATED_CHARS: usize = 40;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the numbered context section from search results, in retrieval
    /// order, using at most `max_chars` characters. The entry that crosses
    /// the limit is truncated; everything after it is dropped.
    pub fn build_context(results: &[SearchResult], max_chars: usize) -> String {
        let mut context = String::new();
        let mut used = 0usize;

        for (i, result) in results.iter().enumerate() {
            let header = format!("[{}] {}\n", i + 1, result.chunk.source.reference());
            let body = result.chunk.text.trim();
            let entry_len = header.chars().count() + body.chars().count() + 2;

            if used + entry_len <= max_chars {
                context.push_str(&header);
                context.push_str(body);
                context.push_str("\n\n");
                used += entry_len;
                continue;
            }

            let room = max_chars
                .saturating_sub(used)
                .saturating_sub(header.chars().count() + 2);
            if room >= MIN_TRUNCATED_CHARS {
                context.push_str(&header);
                context.extend(body.chars().take(room));
                context.push_str("\n\n");
            }
            tracing::debug!(
                "Context limit of {} chars reached; {} of {} chunks used",
                max_chars,
                if room >= MIN_TRUNCATED_CHARS { i + 1 } else { i },
                results.len()
            );
            break;
        }

        context.truncate(context.trim_end().len());
        context
    }

    /// Build the full RAG prompt
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a document analysis assistant. Answer the question using only the document excerpts below.

RULES:
1. Use only information stated in the excerpts
2. If the excerpts do not contain the answer, say that the document does not say
3. Be concise; quote numbers and names exactly as they appear
4. When useful, mention where a fact came from, e.g. (Row 3) or (Page 2)

DOCUMENT EXCERPTS:
{context}

QUESTION: {question}

ANSWER:"#,
            context = context,
            question = question.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkSource, FileType};

    fn result(text: &str, position: u32) -> SearchResult {
        SearchResult {
            chunk: Chunk::new(
                text.to_string(),
                ChunkSource::new("menu.pdf", FileType::Pdf, position),
            ),
            similarity: 0.5,
        }
    }

    #[test]
    fn test_context_keeps_retrieval_order() {
        let results = vec![result("Pizza costs 12.", 4), result("Pasta costs 9.", 1)];
        let context = PromptBuilder::build_context(&results, 6000);

        assert_eq!(
            context,
            "[1] menu.pdf, Page 4\nPizza costs 12.\n\n[2] menu.pdf, Page 1\nPasta costs 9."
        );
    }

    #[test]
    fn test_context_is_bounded() {
        let long = "word ".repeat(400);
        let results = vec![result(&long, 1), result(&long, 2), result("tail", 3)];
        let context = PromptBuilder::build_context(&results, 1000);

        assert!(context.chars().count() <= 1000);
        assert!(context.starts_with("[1] menu.pdf, Page 1"));
        assert!(!context.contains("[3]"));
    }

    #[test]
    fn test_tiny_remainder_is_dropped() {
        let results = vec![result(&"a".repeat(80), 1), result(&"b".repeat(80), 2)];
        let context = PromptBuilder::build_context(&results, 120);

        assert!(context.contains("[1]"));
        assert!(!context.contains("[2]"));
    }

    #[test]
    fn test_rag_prompt_contains_question_and_context() {
        let prompt = PromptBuilder::build_rag_prompt("  What is the price? ", "[1] x.csv, Row 1\nprice: 3");

        assert!(prompt.contains("QUESTION: What is the price?\n"));
        assert!(prompt.contains("DOCUMENT EXCERPTS:\n[1] x.csv, Row 1\nprice: 3"));
        assert!(prompt.ends_with("ANSWER:"));
    }
}

//! Request types

use serde::{Deserialize, Serialize};

/// Words that end an interactive session
pub const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "q", "bye"];

/// Check whether a line of user input ends the session
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&input.as_str())
}

/// Question request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (defaults to the configured `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        for word in ["exit", "QUIT", " q ", "Bye"] {
            assert!(is_exit_command(word), "{word}");
        }
        assert!(!is_exit_command("quite"));
        assert!(!is_exit_command("what is q?"));
    }

    #[test]
    fn test_request_top_k_optional() {
        let req: QueryRequest = serde_json::from_str(r#"{"question":"Average rating?"}"#).unwrap();
        assert_eq!(req.top_k, None);
        assert_eq!(QueryRequest::new("x").with_top_k(2).top_k, Some(2));
    }
}

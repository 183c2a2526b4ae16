use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One matching line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchMatch {
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The raw line, without its terminator
    pub content: String,
}

impl SearchMatch {
    /// Renders the match as `path:line: content` with surrounding whitespace trimmed
    pub fn to_plain(&self) -> String {
        format!(
            "{}:{}: {}",
            self.file.display(),
            self.line,
            self.content.trim()
        )
    }
}

/// The complete result of one search invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutput {
    pub matches: Vec<SearchMatch>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutput {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds a result that carries only an error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Appends matches until `max` is reached; returns false once the cap is hit
    pub fn extend_capped(&mut self, matches: Vec<SearchMatch>, max: usize) -> bool {
        for m in matches {
            if self.matches.len() >= max {
                break;
            }
            self.matches.push(m);
        }
        self.count = self.matches.len();
        self.matches.len() < max
    }
}

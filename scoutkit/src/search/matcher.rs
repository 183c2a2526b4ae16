use regex::{Regex, RegexBuilder};

use crate::errors::{ScoutError, ScoutResult};

/// Strategy for pattern matching
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Substring search; the needle is already lower-cased when `ignore_case` is set
    Literal { needle: String, ignore_case: bool },
    Regex(Regex),
}

/// Tests single lines against a literal or regular-expression pattern
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    strategy: MatchStrategy,
}

impl PatternMatcher {
    /// Builds a matcher, compiling `pattern` when `is_regex` is set.
    ///
    /// An invalid expression is reported here, before any file is opened.
    pub fn new(pattern: &str, is_regex: bool, ignore_case: bool) -> ScoutResult<Self> {
        let strategy = if is_regex {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(ignore_case)
                .build()
                .map_err(|e| ScoutError::invalid_pattern(format!("Invalid regex: {}", e)))?;
            MatchStrategy::Regex(regex)
        } else if ignore_case {
            MatchStrategy::Literal {
                needle: pattern.to_lowercase(),
                ignore_case: true,
            }
        } else {
            MatchStrategy::Literal {
                needle: pattern.to_string(),
                ignore_case: false,
            }
        };
        Ok(Self { strategy })
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }

    /// Checks whether the line contains the pattern
    pub fn is_match(&self, line: &str) -> bool {
        match &self.strategy {
            MatchStrategy::Literal {
                needle,
                ignore_case: true,
            } => line.to_lowercase().contains(needle.as_str()),
            MatchStrategy::Literal { needle, .. } => line.contains(needle.as_str()),
            MatchStrategy::Regex(regex) => regex.is_match(line),
        }
    }
}

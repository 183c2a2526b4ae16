//! Heuristic, line-oriented symbol extraction and resolution.
//!
//! Recognition is driven by per-language regular expressions applied one
//! line at a time; there is no parser behind it. Exotic syntax (multi-line
//! signatures, declarations inside string literals, macros that expand to
//! items) is missed or misclassified, and that is accepted behavior.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ScoutError;

pub mod extractor;
pub mod languages;
pub mod resolver;

pub use extractor::{analyze_file, analyze_path, AnalyzeOptions};
pub use languages::{language_for_path, LanguageSpec};
pub use resolver::{resolve, ResolveOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Import,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Import => "import",
            SymbolKind::Variable => "variable",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "function" => Ok(SymbolKind::Function),
            "method" => Ok(SymbolKind::Method),
            "class" => Ok(SymbolKind::Class),
            "import" => Ok(SymbolKind::Import),
            "variable" => Ok(SymbolKind::Variable),
            other => Err(ScoutError::config_error(format!(
                "Unknown symbol type '{}' (expected function, method, class, import or variable)",
                other
            ))),
        }
    }
}

/// A declaration recognized by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    /// 1-based line of the declaration
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
}

/// A place in a file, for resolver output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    /// The line with surrounding whitespace trimmed
    pub text: String,
}

/// One symbol with its defining location and every other occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub name: String,
    /// Kind of the definition; `null` when no definition was found
    #[serde(rename = "type")]
    pub kind: Option<SymbolKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Location>,
    pub references: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub symbols: Vec<ResolvedSymbol>,
    pub total_refs: usize,
    pub files_searched: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Symbols, imports and line count of one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    /// Language name, empty when the extension is not recognized
    pub language: String,
    pub symbols: Vec<SymbolInfo>,
    pub imports: Vec<String>,
    pub line_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub files: Vec<FileAnalysis>,
    pub total_files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("function".parse::<SymbolKind>().unwrap(), SymbolKind::Function);
        assert_eq!(" Class ".parse::<SymbolKind>().unwrap(), SymbolKind::Class);
        assert!("struct".parse::<SymbolKind>().is_err());
    }

    #[test]
    fn test_symbol_serialization() {
        let symbol = SymbolInfo {
            name: "area".to_string(),
            kind: SymbolKind::Method,
            line: 4,
            signature: Some("self".to_string()),
            parent: Some("Shape".to_string()),
            decorators: vec![],
        };
        let json = serde_json::to_value(&symbol).unwrap();
        assert_eq!(json["type"], "method");
        assert_eq!(json["parent"], "Shape");
        assert!(json.get("decorators").is_none());
    }

    #[test]
    fn test_unresolved_kind_is_null() {
        let symbol = ResolvedSymbol {
            name: "missing".to_string(),
            kind: None,
            definition: None,
            references: vec![],
        };
        let json = serde_json::to_value(&symbol).unwrap();
        assert!(json["type"].is_null());
        assert!(json.get("definition").is_none());
        assert!(json["references"].as_array().unwrap().is_empty());
    }
}

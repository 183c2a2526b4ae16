use regex::Regex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::languages::{captured_indent, captured_name, language_for_path, LanguageSpec};
use super::{Location, ResolveResult, ResolvedSymbol, SymbolKind};
use crate::config::{default_thread_count, DEFAULT_EXCLUDE_DIRS};
use crate::errors::{ScoutError, ScoutResult};
use crate::filters::ExtensionFilter;
use crate::pool::WorkerPool;
use crate::walker::PathWalker;

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub symbol: String,
    pub root: PathBuf,
    pub extensions: ExtensionFilter,
    pub exclude_dirs: Vec<String>,
    pub thread_count: NonZeroUsize,
}

impl ResolveOptions {
    pub fn new(symbol: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            symbol: symbol.into(),
            root: root.into(),
            extensions: ExtensionFilter::any(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            thread_count: default_thread_count(),
        }
    }
}

/// One occurrence of the target name in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub location: Location,
    /// Set when the line declares the name
    pub definition: Option<SymbolKind>,
}

/// Returns the kind and byte offset of `name` when `line` declares it
pub fn definition_on_line(lang: &LanguageSpec, line: &str, name: &str) -> Option<(SymbolKind, usize)> {
    let declared = |re: &Regex| {
        re.captures(line).and_then(|caps| {
            let m = captured_name(&caps)?;
            (m.as_str() == name).then(|| (caps.name("recv").is_some(), captured_indent(&caps), m.start()))
        })
    };

    if let Some((has_receiver, indent, offset)) = declared(&lang.function) {
        let kind = if has_receiver || indent > 0 {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        return Some((kind, offset));
    }

    let tables = [
        (lang.class.as_ref(), SymbolKind::Class),
        (lang.method.as_ref(), SymbolKind::Method),
        (lang.variable.as_ref(), SymbolKind::Variable),
    ];
    tables.into_iter().find_map(|(re, kind)| {
        let (_, _, offset) = declared(re?)?;
        Some((kind, offset))
    })
}

/// 1-based character column of a byte offset
fn column_at(line: &str, offset: usize) -> usize {
    line.get(..offset).map_or(0, |prefix| prefix.chars().count()) + 1
}

/// Scans one source text for definitions and whole-word references of a name
pub fn scan_occurrences(
    lang: &LanguageSpec,
    file: &Path,
    source: &str,
    name: &str,
    word: &Regex,
) -> Vec<Occurrence> {
    let mut found = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let (definition, offset) = match definition_on_line(lang, line, name) {
            Some((kind, offset)) => (Some(kind), offset),
            None => match word.captures(line).and_then(|caps| caps.name("word")) {
                Some(m) => (None, m.start()),
                None => continue,
            },
        };

        found.push(Occurrence {
            location: Location {
                file: file.to_path_buf(),
                line: index + 1,
                column: column_at(line, offset),
                text: line.trim().to_string(),
            },
            definition,
        });
    }

    found
}

/// Compiles the whole-word matcher for a symbol name.
///
/// Identifier characters are word characters plus `$`; the name itself is
/// the `word` group.
pub fn whole_word(name: &str) -> ScoutResult<Regex> {
    Regex::new(&format!(r"(?:^|[^\w$])(?P<word>{})(?:[^\w$]|$)", regex::escape(name)))
        .map_err(|e| ScoutError::invalid_pattern(e.to_string()))
}

/// Finds the definition and every other occurrence of one symbol.
///
/// Files are scanned in parallel but folded in walk order (sorted by name
/// within each directory), so the definition kept is the first one in that
/// order regardless of worker count. Later definitions are reported as
/// references; the kept definition never appears among them.
pub fn resolve(options: &ResolveOptions) -> ResolveResult {
    info!("Resolving {:?} under {}", options.symbol, options.root.display());

    match run_resolve(options) {
        Ok(result) => {
            info!(
                "Resolved {:?}: {} references in {} files",
                options.symbol, result.total_refs, result.files_searched
            );
            result
        }
        Err(e) => ResolveResult {
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

fn run_resolve(options: &ResolveOptions) -> ScoutResult<ResolveResult> {
    if options.symbol.trim().is_empty() {
        return Err(ScoutError::config_error("symbol name is empty"));
    }
    let word = whole_word(&options.symbol)?;

    let files: Vec<PathBuf> = PathWalker::new(&options.root)
        .extensions(options.extensions.clone())
        .exclude(options.exclude_dirs.iter().cloned())
        .collect()?
        .into_iter()
        .filter(|p| language_for_path(p).is_some())
        .collect();

    let pool = WorkerPool::new(options.thread_count)?;
    let per_file = pool.map(&files, |path| {
        let Some(lang) = language_for_path(path) else {
            return Vec::new();
        };
        match std::fs::read(path) {
            Ok(bytes) => scan_occurrences(
                lang,
                path,
                &String::from_utf8_lossy(&bytes),
                &options.symbol,
                &word,
            ),
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                Vec::new()
            }
        }
    });

    let mut symbol = ResolvedSymbol {
        name: options.symbol.clone(),
        kind: None,
        definition: None,
        references: Vec::new(),
    };
    for occurrence in per_file.into_iter().flatten() {
        match occurrence.definition {
            Some(kind) if symbol.definition.is_none() => {
                symbol.kind = Some(kind);
                symbol.definition = Some(occurrence.location);
            }
            _ => symbol.references.push(occurrence.location),
        }
    }

    Ok(ResolveResult {
        total_refs: symbol.references.len(),
        files_searched: files.len(),
        symbols: vec![symbol],
        error: None,
    })
}

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use super::languages::{
    captured_indent, captured_name, captured_signature, language_for_path, LanguageSpec,
};
use super::{AnalysisResult, FileAnalysis, SymbolInfo, SymbolKind};
use crate::config::{default_thread_count, DEFAULT_EXCLUDE_DIRS};
use crate::errors::{ScoutError, ScoutResult};
use crate::filters::ExtensionFilter;
use crate::pool::WorkerPool;
use crate::walker::PathWalker;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// A single file or a directory to walk
    pub path: PathBuf,
    pub extensions: ExtensionFilter,
    /// Only symbols of this kind are emitted; imports are always listed
    pub kind: Option<SymbolKind>,
    pub max_depth: Option<usize>,
    pub exclude_dirs: Vec<String>,
    pub thread_count: NonZeroUsize,
}

impl AnalyzeOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions: ExtensionFilter::any(),
            kind: None,
            max_depth: None,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            thread_count: default_thread_count(),
        }
    }
}

/// Multi-line import being accumulated
#[derive(Debug, Clone)]
struct ImportBuffer {
    text: String,
    line: usize,
    depth: i32,
}

/// State carried from one line to the next while scanning a single file
#[derive(Debug, Default)]
pub struct ScanState {
    current_class: Option<String>,
    pending_decorators: Vec<String>,
    import_buffer: Option<ImportBuffer>,
}

/// Symbols and imports collected from one source text
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub symbols: Vec<SymbolInfo>,
    pub imports: Vec<String>,
}

impl ScanOutput {
    fn push(&mut self, kind_filter: Option<SymbolKind>, symbol: SymbolInfo) {
        if kind_filter.map_or(true, |k| k == symbol.kind) {
            self.symbols.push(symbol);
        }
    }

    fn push_import(&mut self, kind_filter: Option<SymbolKind>, text: String, line: usize) {
        self.imports.push(text.clone());
        self.push(
            kind_filter,
            SymbolInfo {
                name: text,
                kind: SymbolKind::Import,
                line,
                signature: None,
                parent: None,
                decorators: Vec::new(),
            },
        );
    }
}

/// Net count of opening minus closing brackets, ignoring string literals
/// and anything after the line comment marker
fn bracket_delta(text: &str, comment_prefix: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices();

    while let Some((offset, c)) = chars.next() {
        if let Some(open) = quote {
            if c == '\\' {
                chars.next();
            } else if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '{' => depth += 1,
            ')' | '}' => depth -= 1,
            _ if !comment_prefix.is_empty() && text[offset..].starts_with(comment_prefix) => break,
            _ => {}
        }
    }
    depth
}

/// Scans source text in one forward pass
pub fn scan_source(lang: &LanguageSpec, source: &str, kind_filter: Option<SymbolKind>) -> ScanOutput {
    let mut state = ScanState::default();
    let mut out = ScanOutput::default();

    for (index, line) in source.lines().enumerate() {
        scan_line(lang, &mut state, &mut out, kind_filter, index + 1, line);
    }

    // An import still open at end of file is reported as written
    if let Some(buffer) = state.import_buffer.take() {
        out.push_import(kind_filter, buffer.text, buffer.line);
    }
    out
}

fn scan_line(
    lang: &LanguageSpec,
    state: &mut ScanState,
    out: &mut ScanOutput,
    kind_filter: Option<SymbolKind>,
    line_no: usize,
    line: &str,
) {
    let trimmed = line.trim();

    if let Some(buffer) = state.import_buffer.as_mut() {
        if !trimmed.is_empty() {
            buffer.text.push(' ');
            buffer.text.push_str(trimmed);
            buffer.depth += bracket_delta(trimmed, lang.comment_prefix);
        }
        if buffer.depth <= 0 {
            if let Some(done) = state.import_buffer.take() {
                out.push_import(kind_filter, done.text, done.line);
            }
        }
        return;
    }

    if trimmed.is_empty() {
        return;
    }

    let at_column_zero = !line.starts_with(char::is_whitespace);
    let is_comment = trimmed.starts_with(lang.comment_prefix);

    if lang.indent_significant {
        if at_column_zero && !is_comment {
            state.current_class = None;
        }
    } else if line.starts_with('}') {
        state.current_class = None;
        state.pending_decorators.clear();
        return;
    }

    if is_comment {
        state.pending_decorators.clear();
        return;
    }

    if let Some(caps) = lang.decorator.as_ref().and_then(|re| re.captures(line)) {
        if let Some(dec) = caps.name("dec") {
            state.pending_decorators.push(dec.as_str().trim().to_string());
        }
        return;
    }

    if lang.import.is_match(line) {
        state.pending_decorators.clear();
        let depth = bracket_delta(trimmed, lang.comment_prefix);
        if depth > 0 {
            state.import_buffer = Some(ImportBuffer {
                text: trimmed.to_string(),
                line: line_no,
                depth,
            });
        } else {
            out.push_import(kind_filter, trimmed.to_string(), line_no);
        }
        return;
    }

    if let Some(caps) = lang.scope.as_ref().and_then(|re| re.captures(line)) {
        if let Some(name) = captured_name(&caps) {
            trace!("Entering scope {} at line {}", name.as_str(), line_no);
            state.current_class = Some(name.as_str().to_string());
        }
        state.pending_decorators.clear();
        return;
    }

    if let Some(caps) = lang.class.as_ref().and_then(|re| re.captures(line)) {
        if let Some(name) = captured_name(&caps) {
            let name = name.as_str().to_string();
            let parent = if captured_indent(&caps) > 0 {
                state.current_class.clone()
            } else {
                state.current_class = Some(name.clone());
                None
            };
            out.push(
                kind_filter,
                SymbolInfo {
                    name,
                    kind: SymbolKind::Class,
                    line: line_no,
                    signature: None,
                    parent,
                    decorators: std::mem::take(&mut state.pending_decorators),
                },
            );
            return;
        }
    }

    if let Some(caps) = lang.function.captures(line) {
        if let Some(name) = captured_name(&caps) {
            let (kind, parent) = if let Some(recv) = caps.name("recv") {
                (SymbolKind::Method, Some(recv.as_str().to_string()))
            } else if captured_indent(&caps) > 0 && state.current_class.is_some() {
                (SymbolKind::Method, state.current_class.clone())
            } else {
                (SymbolKind::Function, None)
            };
            out.push(
                kind_filter,
                SymbolInfo {
                    name: name.as_str().to_string(),
                    kind,
                    line: line_no,
                    signature: captured_signature(&caps),
                    parent,
                    decorators: std::mem::take(&mut state.pending_decorators),
                },
            );
            return;
        }
    }

    if let Some(class_name) = state.current_class.clone() {
        if let Some(caps) = lang.method.as_ref().and_then(|re| re.captures(line)) {
            if let Some(name) = captured_name(&caps) {
                if !lang.reserved.contains(&name.as_str()) {
                    out.push(
                        kind_filter,
                        SymbolInfo {
                            name: name.as_str().to_string(),
                            kind: SymbolKind::Method,
                            line: line_no,
                            signature: captured_signature(&caps),
                            parent: Some(class_name),
                            decorators: std::mem::take(&mut state.pending_decorators),
                        },
                    );
                    return;
                }
            }
        }
    }

    if let Some(caps) = lang.variable.as_ref().and_then(|re| re.captures(line)) {
        if let Some(name) = captured_name(&caps) {
            out.push(
                kind_filter,
                SymbolInfo {
                    name: name.as_str().to_string(),
                    kind: SymbolKind::Variable,
                    line: line_no,
                    signature: None,
                    parent: None,
                    decorators: std::mem::take(&mut state.pending_decorators),
                },
            );
            return;
        }
    }

    state.pending_decorators.clear();
}

/// Analyzes one file; files without a language table only report their line count
pub fn analyze_file(path: &Path, kind_filter: Option<SymbolKind>) -> FileAnalysis {
    let lang = language_for_path(path);
    let mut analysis = FileAnalysis {
        path: path.to_path_buf(),
        language: lang.map(|l| l.name.to_string()).unwrap_or_default(),
        ..Default::default()
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            analysis.error = Some(ScoutError::from_io(path, e).to_string());
            return analysis;
        }
    };
    let source = String::from_utf8_lossy(&bytes);
    analysis.line_count = source.lines().count();

    if let Some(lang) = lang {
        let out = scan_source(lang, &source, kind_filter);
        analysis.symbols = out.symbols;
        analysis.imports = out.imports;
    }
    analysis
}

/// Analyzes a single file or every file with a known language under a directory
pub fn analyze_path(options: &AnalyzeOptions) -> AnalysisResult {
    info!("Analyzing {}", options.path.display());

    let mut result = match collect_analyses(options) {
        Ok(files) => AnalysisResult {
            files,
            ..Default::default()
        },
        Err(e) => AnalysisResult {
            error: Some(format!("Cannot access path: {}", e)),
            ..Default::default()
        },
    };
    result.total_files = result.files.len();

    info!("Analyzed {} files", result.total_files);
    result
}

fn collect_analyses(options: &AnalyzeOptions) -> ScoutResult<Vec<FileAnalysis>> {
    let metadata =
        std::fs::metadata(&options.path).map_err(|e| ScoutError::from_io(&options.path, e))?;

    if !metadata.is_dir() {
        return Ok(vec![analyze_file(&options.path, options.kind)]);
    }

    let files: Vec<PathBuf> = PathWalker::new(&options.path)
        .extensions(options.extensions.clone())
        .exclude(options.exclude_dirs.iter().cloned())
        .max_depth(options.max_depth)
        .collect()?
        .into_iter()
        .filter(|p| language_for_path(p).is_some())
        .collect();
    debug!("Found {} source files", files.len());

    let pool = WorkerPool::new(options.thread_count)?;
    Ok(pool.map(&files, |path| analyze_file(path, options.kind)))
}

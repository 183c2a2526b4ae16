//! Per-language declaration patterns.
//!
//! Every table is plain data: the extractor and resolver interpret the named
//! capture groups, never the language itself. Groups used:
//!
//! * `indent`: leading whitespace, when the pattern is not anchored at column 0
//! * `name` / `alt_name`: the declared identifier (first one present wins)
//! * `sig` / `alt_sig`: parameter list for functions and methods
//! * `recv`: Go method receiver type
//! * `dec`: decorator or attribute text
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

#[derive(Debug)]
pub struct LanguageSpec {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    /// Indentation decides class membership (Python) instead of braces
    pub indent_significant: bool,
    pub comment_prefix: &'static str,
    pub function: Regex,
    /// Indented class members in brace languages
    pub method: Option<Regex>,
    pub class: Option<Regex>,
    /// Opens a container that sets the enclosing class without being a symbol (Rust `impl`)
    pub scope: Option<Regex>,
    pub variable: Option<Regex>,
    pub import: Regex,
    pub decorator: Option<Regex>,
    /// Identifiers the method pattern must never report (control-flow keywords)
    pub reserved: &'static [&'static str],
}

fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("built-in symbol pattern must compile")
}

const JS_FUNCTION: &str = r#"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[\w$]+)\s*(?:<[^>]*>)?\s*\((?P<sig>[^)]*)|^(?:export\s+)?(?:const|let|var)\s+(?P<alt_name>[\w$]+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\((?P<alt_sig>[^)]*)\)\s*(?::[^=]+)?=>|[\w$]+\s*=>)"#;
const JS_METHOD: &str = r#"^(?P<indent>\s+)(?:(?:public|private|protected|static|async|readonly|override|abstract|get|set)\s+)*\*?(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\((?P<sig>[^)]*)\)[^;]*\{\s*$"#;
const JS_IMPORT: &str = r#"^import\b\s*[\w*{'"]|^(?:const|let|var)\s+[\w${}\s,]+=\s*require\("#;
const DECORATOR_AT: &str = r"^\s*@(?P<dec>[\w$]+(?:\.[\w$]+)*(?:\(.*\))?)";
const BRACE_RESERVED: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "with", "do", "else", "try",
];

static PYTHON: Lazy<LanguageSpec> = Lazy::new(|| LanguageSpec {
    name: "python",
    extensions: &["py"],
    indent_significant: true,
    comment_prefix: "#",
    function: pattern(r"^(?P<indent>\s*)(?:async\s+)?def\s+(?P<name>\w+)\s*\((?P<sig>.*?)(?:\).*)?$"),
    method: None,
    class: Some(pattern(r"^(?P<indent>\s*)class\s+(?P<name>\w+)\s*(?:\(.*\))?\s*:")),
    scope: None,
    variable: Some(pattern(r"^(?P<name>[A-Za-z_]\w*)\s*(?::[^=]*)?=(?:[^=]|$)")),
    import: pattern(r"^\s*(?:from\s+\S+\s+)?import\s+\S"),
    decorator: Some(pattern(DECORATOR_AT)),
    reserved: &[],
});

static GO: Lazy<LanguageSpec> = Lazy::new(|| LanguageSpec {
    name: "go",
    extensions: &["go"],
    indent_significant: false,
    comment_prefix: "//",
    function: pattern(
        r"^func\s+(?:\(\s*(?:\w+\s+)?\*?(?P<recv>\w+)(?:\[[^\]]*\])?\s*\)\s*)?(?P<name>\w+)\s*(?:\[[^\]]*\])?\((?P<sig>[^)]*)",
    ),
    method: None,
    class: Some(pattern(r"^type\s+(?P<name>\w+)(?:\[[^\]]*\])?\s*=?\s*\S")),
    scope: None,
    variable: Some(pattern(r"^(?:var|const)\s+(?P<name>\w+)")),
    import: pattern(r#"^import\s*(?:\(|(?:[\w.]+\s+)?")"#),
    decorator: None,
    reserved: &[],
});

static JAVASCRIPT: Lazy<LanguageSpec> = Lazy::new(|| LanguageSpec {
    name: "javascript",
    extensions: &["js", "jsx", "mjs", "cjs"],
    indent_significant: false,
    comment_prefix: "//",
    function: pattern(JS_FUNCTION),
    method: Some(pattern(JS_METHOD)),
    class: Some(pattern(
        r"^(?:export\s+)?(?:default\s+)?class\s+(?P<name>[\w$]+)",
    )),
    scope: None,
    variable: Some(pattern(r"^(?:export\s+)?(?:const|let|var)\s+(?P<name>[\w$]+)")),
    import: pattern(JS_IMPORT),
    decorator: Some(pattern(DECORATOR_AT)),
    reserved: BRACE_RESERVED,
});

static TYPESCRIPT: Lazy<LanguageSpec> = Lazy::new(|| LanguageSpec {
    name: "typescript",
    extensions: &["ts", "tsx"],
    indent_significant: false,
    comment_prefix: "//",
    function: pattern(JS_FUNCTION),
    method: Some(pattern(JS_METHOD)),
    class: Some(pattern(
        r"^(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:class|interface)\s+(?P<name>[\w$]+)",
    )),
    scope: None,
    variable: Some(pattern(
        r"^(?:export\s+)?(?:declare\s+)?(?:const|let|var)\s+(?P<name>[\w$]+)",
    )),
    import: pattern(JS_IMPORT),
    decorator: Some(pattern(DECORATOR_AT)),
    reserved: BRACE_RESERVED,
});

static RUST: Lazy<LanguageSpec> = Lazy::new(|| LanguageSpec {
    name: "rust",
    extensions: &["rs"],
    indent_significant: false,
    comment_prefix: "//",
    function: pattern(
        r#"^(?P<indent>\s*)(?:pub(?:\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(?P<name>\w+)\s*(?:<[^(]*>)?\s*\((?P<sig>[^)]*)"#,
    ),
    method: None,
    class: Some(pattern(
        r"^(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union)\s+(?P<name>\w+)",
    )),
    scope: Some(pattern(
        r"^(?:unsafe\s+)?impl(?:<[^>]*>)?\s+(?:!?[\w:]+(?:<[^>]*>)?\s+for\s+)?(?P<name>\w+)",
    )),
    variable: Some(pattern(
        r"^(?:pub(?:\([^)]*\))?\s+)?(?:const|static)\s+(?:mut\s+)?(?P<name>\w+)\s*:",
    )),
    import: pattern(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+\S"),
    decorator: Some(pattern(r"^\s*#\[(?P<dec>.+)\]\s*$")),
    reserved: &[],
});

/// Every supported language
pub fn all_languages() -> [&'static LanguageSpec; 5] {
    [&*PYTHON, &*GO, &*JAVASCRIPT, &*TYPESCRIPT, &*RUST]
}

/// Looks up the table for a file by its extension (case-insensitive)
pub fn language_for_path(path: &Path) -> Option<&'static LanguageSpec> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    all_languages()
        .into_iter()
        .find(|lang| lang.extensions.contains(&ext.as_str()))
}

/// First present group out of `name` and `alt_name`
pub(crate) fn captured_name<'t>(caps: &Captures<'t>) -> Option<regex::Match<'t>> {
    caps.name("name").or_else(|| caps.name("alt_name"))
}

/// First present group out of `sig` and `alt_sig`, trimmed
pub(crate) fn captured_signature(caps: &Captures<'_>) -> Option<String> {
    caps.name("sig")
        .or_else(|| caps.name("alt_sig"))
        .map(|m| m.as_str().trim().to_string())
}

/// Width of the `indent` group; 0 when the pattern has none
pub(crate) fn captured_indent(caps: &Captures<'_>) -> usize {
    caps.name("indent").map_or(0, |m| m.as_str().len())
}

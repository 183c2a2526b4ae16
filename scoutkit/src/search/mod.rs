//! Literal and regular-expression line search across a tree.
//!
//! The engine walks the tree with [`PathWalker`](crate::walker::PathWalker),
//! drops binary-looking files by extension, and scans the rest on the worker
//! pool. Each file is read line by line: large files through a memory map,
//! the rest through a buffered reader. Bytes that are not valid UTF-8 are
//! replaced rather than failing the file.
//!
//! ```rust,ignore
//! let mut options = SearchOptions::new("TODO", "src");
//! options.max_results = 20;
//! let output = search(&options);
//! for m in &output.matches {
//!     println!("{}", m.to_plain());
//! }
//! ```
pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::{search, SearchOptions};
pub use matcher::{MatchStrategy, PatternMatcher};
pub use processor::FileProcessor;

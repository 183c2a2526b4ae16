use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::DEFAULT_EXCLUDE_DIRS;
use crate::errors::{ScoutError, ScoutResult};
use crate::filters::{is_pruned_dir, ExtensionFilter};

/// Recursive traversal shared by every tree-scoped engine.
///
/// Hidden directories (leading `.`, never the root itself) and directories in
/// the exclude set are pruned before their contents are read. Ignore files
/// such as `.gitignore` are deliberately not consulted: a file is skipped only
/// because of an explicit filter.
#[derive(Debug, Clone)]
pub struct PathWalker {
    root: PathBuf,
    extensions: ExtensionFilter,
    exclude: HashSet<String>,
    max_depth: Option<usize>,
}

impl PathWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: ExtensionFilter::any(),
            exclude: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            max_depth: None,
        }
    }

    pub fn extensions(mut self, extensions: ExtensionFilter) -> Self {
        self.extensions = extensions;
        self
    }

    /// Replaces the excluded directory names
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    /// Files more than `depth` levels below the root are skipped; `None` is unlimited
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collects every regular file that passes the filters, in a stable order
    pub fn collect(&self) -> ScoutResult<Vec<PathBuf>> {
        std::fs::metadata(&self.root).map_err(|e| ScoutError::from_io(&self.root, e))?;

        let exclude = self.exclude.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .max_depth(self.max_depth)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if !is_dir {
                    return true;
                }
                match entry.file_name().to_str() {
                    Some(name) => !is_pruned_dir(name, &exclude),
                    None => true,
                }
            });

        let mut files = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            let is_file = match entry.file_type() {
                Some(ft) if ft.is_file() => true,
                // Symlinks count when they resolve to a regular file
                Some(ft) if ft.is_symlink() => entry.path().is_file(),
                _ => false,
            };
            if !is_file || !self.extensions.matches(entry.path()) {
                continue;
            }

            trace!("Collected {}", entry.path().display());
            files.push(entry.into_path());
        }

        debug!(
            "Walk of {} collected {} files",
            self.root.display(),
            files.len()
        );
        Ok(files)
    }
}

//! @ai:module:intent Collect comment blocks per source file from a set of root directories
//! @ai:module:layer infrastructure
//! @ai:module:public_api SourceAdapter, CommentAdapter, SourceFile
//! @ai:module:depends_on comments, language, error

use crate::comments::{extract_comment_blocks, CommentBlock};
use crate::error::{Error, Result};
use crate::language::{detect_language, Language};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
pub const DEFAULT_EXCLUDES: [&str; 4] = ["vendor", "target", "node_modules", ".git"];

/// @ai:intent Comment blocks of one source file, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
    pub blocks: Vec<CommentBlock>,
}

impl SourceFile {
    /// @ai:intent Extract the comment blocks of in-memory source text
    /// @ai:effects pure
    pub fn parse(path: impl Into<PathBuf>, language: Language, content: &str) -> Self {
        Self {
            path: path.into(),
            language,
            blocks: extract_comment_blocks(content, language),
        }
    }
}

/// @ai:intent Capability: given roots, produce ordered per-file comment blocks
pub trait SourceAdapter {
    /// @ai:intent Collect every source file below the roots
    /// @ai:post missing roots are skipped; file order is deterministic
    fn collect(&self, roots: &[PathBuf]) -> Result<Vec<SourceFile>>;
}

/// @ai:intent Filesystem adapter that scans files of the configured languages
#[derive(Debug, Clone)]
pub struct CommentAdapter {
    languages: Vec<Language>,
    exclude: Vec<String>,
}

impl CommentAdapter {
    /// @ai:intent Create an adapter for the given languages with the default excludes
    pub fn new(languages: Vec<Language>) -> Self {
        Self {
            languages,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// @ai:intent Replace the excluded directory names
    pub fn with_excludes(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// @ai:intent Language of a path if this adapter scans it
    /// @ai:effects pure
    fn accepts(&self, path: &Path) -> Option<Language> {
        detect_language(path).filter(|lang| self.languages.contains(lang))
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude.iter().any(|ex| ex == name))
    }

    /// @ai:intent Find supported files below a root, sorted by path
    /// @ai:effects fs:read
    fn find_source_files(&self, root: &Path) -> Result<Vec<(PathBuf, Language)>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(language) = self.accepts(entry.path()) {
                files.push((entry.into_path(), language));
            }
        }

        Ok(files)
    }
}

impl Default for CommentAdapter {
    fn default() -> Self {
        Self::new(vec![Language::Go])
    }
}

impl SourceAdapter for CommentAdapter {
    /// @ai:effects fs:read
    fn collect(&self, roots: &[PathBuf]) -> Result<Vec<SourceFile>> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();

        for root in roots {
            if !root.exists() {
                tracing::info!(root = %root.display(), "Skipping missing source directory");
                continue;
            }

            for (path, language) in self.find_source_files(root)? {
                let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if !seen.insert(key) {
                    continue;
                }

                let bytes = std::fs::read(&path).map_err(|e| Error::FileRead {
                    path: path.clone(),
                    source: e,
                })?;
                let Ok(content) = String::from_utf8(bytes) else {
                    tracing::warn!(file = %path.display(), "Skipping file that is not valid UTF-8");
                    continue;
                };

                tracing::debug!(file = %path.display(), language = %language, "Scanning source file");
                sources.push(SourceFile::parse(path, language, &content));
            }
        }

        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn names(files: &[SourceFile], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_collect_is_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.go", "// b\npackage b\n");
        write(temp.path(), "a/z.go", "// z\npackage a\n");
        write(temp.path(), "a/notes.txt", "// not source\n");
        write(temp.path(), "vendor/dep.go", "// vendored\n");
        write(temp.path(), "c.py", "# python\n");

        let files = CommentAdapter::default()
            .collect(&[temp.path().to_path_buf()])
            .unwrap();

        assert_eq!(names(&files, temp.path()), vec!["a/z.go", "b.go"]);
        assert_eq!(files[0].blocks[0].text(), "z");
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "main.go", "// main\n");

        let roots = vec![temp.path().join("does-not-exist"), temp.path().to_path_buf()];
        let files = CommentAdapter::default().collect(&roots).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_overlapping_roots_read_each_file_once() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pkg/main.go", "// main\n");

        let roots = vec![temp.path().to_path_buf(), temp.path().join("pkg")];
        let files = CommentAdapter::default().collect(&roots).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_multiple_languages_and_custom_excludes() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app.py", "# py\n");
        write(temp.path(), "vendor/lib.go", "// vendored\n");
        write(temp.path(), "gen/out.go", "// generated\n");

        let adapter = CommentAdapter::new(vec![Language::Go, Language::Python])
            .with_excludes(vec!["gen".to_string()]);
        let files = adapter.collect(&[temp.path().to_path_buf()]).unwrap();

        assert_eq!(names(&files, temp.path()), vec!["app.py", "vendor/lib.go"]);
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.go"), [0xff, 0xfe, 0x00]).unwrap();
        write(temp.path(), "good.go", "// ok\n");

        let files = CommentAdapter::default()
            .collect(&[temp.path().to_path_buf()])
            .unwrap();
        assert_eq!(files.len(), 1);
    }
}

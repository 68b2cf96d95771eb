//! Source tree enumeration.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::languages::Lang;

/// One eligible file discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scanned root, `/`-separated.
    pub path: String,
    /// Extension-derived language; `.c`/`.h` are refined from content later.
    pub language: Lang,
    pub mod_time: DateTime<Utc>,
}

/// Walk `root` and return every file with a known extension, sorted by path.
///
/// Hidden entries, `.gitignore`d paths and the `data_dir` directory are skipped.
///
/// # Errors
///
/// Returns [`IndexError::Scan`] if the root is missing or any entry cannot be
/// read.
pub fn scan_files(root: &Path, data_dir: &str) -> Result<Vec<FileRecord>> {
    if !root.is_dir() {
        return Err(IndexError::Scan(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let skip = root.join(data_dir);
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .filter_entry(move |e| e.path() != skip)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| IndexError::Scan(e.to_string()))?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Some(language) = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Lang::from_extension)
        else {
            continue;
        };

        let modified = entry
            .metadata()
            .map_err(|e| IndexError::Scan(format!("{}: {e}", entry.path().display())))?
            .modified()
            .map_err(|e| IndexError::Scan(format!("{}: {e}", entry.path().display())))?;

        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        files.push(FileRecord {
            path: rel.to_string_lossy().replace('\\', "/"),
            language,
            mod_time: DateTime::<Utc>::from(modified),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(root = %root.display(), files = files.len(), "scan complete");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_known_extensions_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.go", "package main");
        write(dir.path(), "docs/guide.md", "# Guide");
        write(dir.path(), "image.png", "binary");
        write(dir.path(), "Makefile", "all:");

        let files = scan_files(dir.path(), ".scout").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["docs/guide.md", "main.go"]);
        assert_eq!(files[1].language, Lang::Go);
    }

    #[test]
    fn skips_hidden_and_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".hidden/secret.py", "x = 1");
        write(dir.path(), ".scout/notes.md", "# internal");
        write(dir.path(), "index-data/notes.md", "# internal");
        write(dir.path(), "app.py", "x = 1");

        let files = scan_files(dir.path(), "index-data").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["app.py"]);
    }

    #[test]
    fn only_the_root_data_dir_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index-data/metadata.md", "# internal");
        write(dir.path(), "docs/index-data/usage.md", "# Usage");
        write(dir.path(), "state/scout/notes.md", "# internal");
        write(dir.path(), "state/readme.md", "# State");

        let files = scan_files(dir.path(), "index-data").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["docs/index-data/usage.md", "state/readme.md", "state/scout/notes.md"]
        );

        let files = scan_files(dir.path(), "state/scout").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "docs/index-data/usage.md",
                "index-data/metadata.md",
                "state/readme.md"
            ]
        );
    }

    #[test]
    fn respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "generated/out.go", "package out");
        write(dir.path(), "lib.rs", "fn a() {}");

        let files = scan_files(dir.path(), ".scout").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "lib.rs");
    }

    #[test]
    fn missing_root_is_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_files(&dir.path().join("nope"), ".scout");
        assert!(matches!(result, Err(IndexError::Scan(_))));
    }

    #[test]
    fn records_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "hello");
        let before = Utc::now() - chrono::Duration::minutes(1);
        let files = scan_files(dir.path(), ".scout").unwrap();
        assert!(files[0].mod_time > before);
    }
}

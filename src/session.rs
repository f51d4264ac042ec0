use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

pub const RESEARCH_PLAN: &str = "00-research-plan.md";
pub const SEARCH_RESULTS_DIR: &str = "01-search-results";
pub const COVERAGE_MATRIX: &str = "coverage-matrix.md";
pub const DEEP_DIVES_DIR: &str = "02-deep-dives";
pub const SYNTHESIS_DIR: &str = "03-synthesis";
pub const VALIDATION_DIR: &str = "04-validation";
pub const CURRENT_UNDERSTANDING: &str = "03-synthesis/current-understanding.md";
pub const MERGED_FINDINGS: &str = "03-synthesis/merged-findings.md";
pub const VERIFICATION_LOG: &str = "04-validation/verification-log.md";
pub const FINAL_REPORT: &str = "FINAL-REPORT.md";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session path does not exist: {0}")]
    MissingRoot(PathBuf),
    #[error("session path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// A research session directory.
#[derive(Debug, Clone)]
pub struct Session {
    root: PathBuf,
}

impl Session {
    pub fn open(root: impl Into<PathBuf>) -> std::result::Result<Self, SessionError> {
        let root = root.into();
        if !root.exists() {
            return Err(SessionError::MissingRoot(root));
        }
        if !root.is_dir() {
            return Err(SessionError::NotADirectory(root));
        }
        Ok(Session { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name of the session, e.g. `2026-02-04-rag-architecture`.
    pub fn name(&self) -> String {
        // "." and ".." have no file name; resolve them first
        let resolved = match self.root.file_name() {
            Some(_) => self.root.clone(),
            None => self.root.canonicalize().unwrap_or_else(|_| self.root.clone()),
        };
        resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// `*.md` files directly under `dir`, sorted by file name.
    /// `None` when the directory does not exist.
    pub fn markdown_files(&self, dir: &str) -> Result<Option<Vec<PathBuf>>> {
        let dir_path = self.path(dir);
        if !dir_path.is_dir() {
            return Ok(None);
        }
        let mut files = Vec::new();
        let entries = std::fs::read_dir(&dir_path)
            .with_context(|| format!("Failed to list {}", dir_path.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list {}", dir_path.display()))?
                .path();
            if path.is_file() && path.extension().is_some_and(|e| e == "md") {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(Some(files))
    }

    /// Search-result documents, without the coverage matrix.
    pub fn search_result_files(&self) -> Result<Option<Vec<PathBuf>>> {
        Ok(self.markdown_files(SEARCH_RESULTS_DIR)?.map(|files| {
            files
                .into_iter()
                .filter(|p| p.file_name().is_some_and(|n| n != COVERAGE_MATRIX))
                .collect()
        }))
    }

    pub fn deep_dive_files(&self) -> Result<Option<Vec<PathBuf>>> {
        self.markdown_files(DEEP_DIVES_DIR)
    }

    /// Read a session file, `None` if it does not exist.
    pub fn read_optional(&self, relative: &str) -> Result<Option<String>> {
        let path = self.path(relative);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(text))
    }
}

pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::open(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SessionError::MissingRoot(_)));
        assert!(err.to_string().starts_with("session path does not exist"));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plan.md");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            Session::open(&file).unwrap_err(),
            SessionError::NotADirectory(_)
        ));
    }

    #[test]
    fn markdown_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join(SEARCH_RESULTS_DIR);
        std::fs::create_dir_all(results.join("nested.md")).unwrap();
        for name in ["reddit.md", "arxiv.md", COVERAGE_MATRIX, "notes.txt"] {
            std::fs::write(results.join(name), "").unwrap();
        }
        let session = Session::open(dir.path()).unwrap();

        let all = session.markdown_files(SEARCH_RESULTS_DIR).unwrap().unwrap();
        let names: Vec<String> = all.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["arxiv", "coverage-matrix", "reddit"]);

        let results = session.search_result_files().unwrap().unwrap();
        let names: Vec<String> = results.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["arxiv", "reddit"]);
    }

    #[test]
    fn missing_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path()).unwrap();
        assert!(session.deep_dive_files().unwrap().is_none());
        assert!(session.read_optional(RESEARCH_PLAN).unwrap().is_none());
    }

    #[test]
    fn name_is_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("2026-02-04-rag-architecture");
        std::fs::create_dir(&root).unwrap();
        assert_eq!(Session::open(&root).unwrap().name(), "2026-02-04-rag-architecture");
    }
}

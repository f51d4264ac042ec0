pub mod final_report;
pub mod merged;

use std::path::Path;

use anyhow::{Context, Result};

/// First `max` characters of `s`.
pub fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Write a rendered document, creating the parent directory if needed.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_counts_chars_not_bytes() {
        assert_eq!(clip("héllo wörld", 7), "héllo w");
        assert_eq!(clip("short", 80), "short");
        assert_eq!(clip("", 3), "");
    }

    #[test]
    fn write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("03-synthesis/merged-findings.md");
        write_report(&out, "# ok\n").unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "# ok\n");
    }
}

//! Discovers PDF files under one or more roots.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Walks `roots` on a blocking task and returns every non-hidden `.pdf`
/// file (extension compared case-insensitively) not matched by `excludes`,
/// sorted by path.
pub async fn scan(roots: &[PathBuf], excludes: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let (tx, mut rx) = mpsc::channel(100);
    let exclude_set = build_globset(excludes)?;
    let roots = roots.to_vec();

    let walker_handle = task::spawn_blocking(move || {
        for root in roots {
            if !root.exists() {
                warn!("scan root {:?} does not exist", root);
                continue;
            }
            for entry in WalkDir::new(&root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || should_descend(e.path(), &exclude_set))
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        debug!("skipping unreadable entry: {}", e);
                        continue;
                    }
                };

                let path = entry.path();
                if !entry.file_type().is_file() || !is_pdf(path) {
                    continue;
                }

                if tx.blocking_send(path.to_path_buf()).is_err() {
                    // Receiver dropped, stop walking.
                    break;
                }
            }
        }
    });

    let mut found = Vec::new();
    while let Some(path) = rx.recv().await {
        found.push(path);
    }
    walker_handle.await?;

    found.sort();
    found.dedup();
    debug!("discovered {} pdf files", found.len());
    Ok(found)
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn should_descend(path: &Path, excludes: &GlobSet) -> bool {
    !excludes.is_match(path) && !is_hidden(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.') && s != "." && s != "..")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn finds_pdfs_case_insensitively_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::create_dir_all(root.join("drafts")).unwrap();
        for name in [
            "a.pdf",
            "nested/B.PDF",
            "nested/deeper/c.Pdf",
            "notes.txt",
            ".hidden.pdf",
            ".cache/d.pdf",
            "drafts/e.pdf",
        ] {
            fs::write(root.join(name), b"%PDF-1.4").unwrap();
        }

        let excludes = vec!["**/drafts".to_string()];
        let found = scan(&[root.to_path_buf()], &excludes).await.unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.pdf", "nested/B.PDF", "nested/deeper/c.Pdf"]);
    }

    #[tokio::test]
    async fn missing_root_yields_nothing() {
        let found = scan(&[PathBuf::from("/definitely/not/here")], &[]).await.unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn invalid_exclude_glob_is_an_error() {
        assert!(build_globset(&["a[".to_string()]).is_err());
    }
}

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Copies `src` into `dest_dir` under its own name, or `name_1.ext`,
/// `name_2.ext`, ... when that name is taken. Never overwrites: each
/// candidate is created with `create_new`, so a file that appears between
/// attempts just moves us on to the next suffix.
pub fn copy_unique(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .with_context(|| format!("{:?} has no file name", src))?;
    fs::create_dir_all(dest_dir).with_context(|| format!("create {:?}", dest_dir))?;
    let mut input = File::open(src).with_context(|| format!("open {:?}", src))?;
    let first = dest_dir.join(name);

    let mut counter = 0;
    loop {
        let target = if counter == 0 {
            first.clone()
        } else {
            suffixed(&first, counter)
        };
        match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(mut output) => {
                if let Err(e) = io::copy(&mut input, &mut output) {
                    drop(output);
                    let _ = fs::remove_file(&target);
                    return Err(e).with_context(|| format!("copy {:?} -> {:?}", src, target));
                }
                debug!("copied {:?} -> {:?}", src, target);
                return Ok(target);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e).with_context(|| format!("create {:?}", target)),
        }
    }
}

/// Copies every file, collecting failures instead of stopping.
pub fn copy_all<'a>(sources: impl IntoIterator<Item = &'a Path>, dest_dir: &Path) -> CopyReport {
    let mut report = CopyReport::default();
    for src in sources {
        match copy_unique(src, dest_dir) {
            Ok(target) => report.copied.push(target),
            Err(e) => {
                warn!("failed to copy {:?}: {:#}", src, e);
                report.failed.push((src.to_path_buf(), format!("{:#}", e)));
            }
        }
    }
    report
}

fn suffixed(dest: &Path, counter: usize) -> PathBuf {
    let stem = dest
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let name = match dest.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}_{}.{}", stem, counter, ext),
        _ => format!("{}_{}", stem, counter),
    };
    dest.parent().unwrap_or_else(|| Path::new(".")).join(name)
}

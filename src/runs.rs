//! Timestamped run directory layout.
//!
//! Each training round gets a fresh directory; manifests and reports are
//! never mutated in place.

use crate::constants::{MANIFEST_FILENAME, REPORT_FILENAME, RUNS_DIR};
use crate::error::{Error, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Paths of one training-round run directory.
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// The run directory itself.
    pub dir: PathBuf,
    /// Manifest path inside the run directory.
    pub manifest: PathBuf,
    /// Evaluation report path inside the run directory.
    pub report: PathBuf,
}

impl RunPaths {
    /// Create a fresh timestamped run directory under `root`.
    ///
    /// Two rounds started within the same second get distinct directories
    /// via a numeric suffix.
    pub fn create(root: &Path) -> Result<Self> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%SZ").to_string();
        let runs_root = root.join(RUNS_DIR);

        let mut dir = runs_root.join(&stamp);
        let mut attempt = 0u32;
        loop {
            match std::fs::create_dir_all(&runs_root).and_then(|()| std::fs::create_dir(&dir))
            {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    dir = runs_root.join(format!("{stamp}-{attempt}"));
                }
                Err(e) => {
                    return Err(Error::RunDirCreate {
                        path: root.to_path_buf(),
                        source: e,
                    });
                }
            }
        }

        Ok(Self {
            manifest: dir.join(MANIFEST_FILENAME),
            report: dir.join(REPORT_FILENAME),
            dir,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_run_dir() {
        let root = TempDir::new().unwrap();
        let run = RunPaths::create(root.path()).unwrap();
        assert!(run.dir.is_dir());
        assert!(run.dir.starts_with(root.path().join("runs")));
        assert!(run.manifest.ends_with("manifest.json"));
        assert!(run.report.ends_with("evaluation.json"));
    }

    #[test]
    fn test_same_second_runs_get_distinct_dirs() {
        let root = TempDir::new().unwrap();
        let first = RunPaths::create(root.path()).unwrap();
        let second = RunPaths::create(root.path()).unwrap();
        assert_ne!(first.dir, second.dir);
        assert!(first.dir.is_dir());
        assert!(second.dir.is_dir());
    }
}

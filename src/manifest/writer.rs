//! Manifest serialization.

use crate::constants::MANIFEST_FILENAME;
use crate::error::{Error, Result};
use crate::manifest::DatasetManifest;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write a manifest into `dir` as pretty JSON, returning the final path.
///
/// Creates the directory if absent. The write is atomic: serialize to a
/// temp file in the same directory, then rename over the destination. An
/// invalid manifest (empty class) is rejected before anything touches the
/// disk.
pub fn write_manifest(manifest: &DatasetManifest, dir: &Path) -> Result<PathBuf> {
    manifest.validate()?;

    fs::create_dir_all(dir).map_err(|e| Error::ManifestWrite {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let path = dir.join(MANIFEST_FILENAME);
    let tmp_path = dir.join(format!("{MANIFEST_FILENAME}.tmp"));

    write_json(manifest, &tmp_path)?;
    fs::rename(&tmp_path, &path).map_err(|e| Error::ManifestWrite {
        path: path.clone(),
        source: e,
    })?;

    debug!("Wrote manifest: {}", path.display());
    Ok(path)
}

fn write_json(manifest: &DatasetManifest, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::ManifestWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest)
        .map_err(|e| Error::ManifestSerialize { source: e })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| Error::ManifestWrite {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::ManifestSummary;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn valid_manifest() -> DatasetManifest {
        DatasetManifest {
            wake_phrase: "hey rust".to_string(),
            seed: 3,
            samples: Vec::new(),
            summary: ManifestSummary {
                selected_positives: 2,
                selected_negatives: 4,
                per_source: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_write_and_reparse() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("run");
        let path = write_manifest(&valid_manifest(), &out).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: DatasetManifest = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.wake_phrase, "hey rust");
        assert_eq!(parsed.summary.selected_positives, 2);
        assert_eq!(parsed.summary.selected_negatives, 4);

        // No temp file left behind.
        assert!(!out.join("manifest.json.tmp").exists());
    }

    #[test]
    fn test_write_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let first = write_manifest(&valid_manifest(), &dir.path().join("a")).unwrap();
        let second = write_manifest(&valid_manifest(), &dir.path().join("b")).unwrap();
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn test_invalid_manifest_never_written() {
        let dir = TempDir::new().unwrap();
        let mut manifest = valid_manifest();
        manifest.summary.selected_negatives = 0;

        let out = dir.path().join("run");
        assert!(write_manifest(&manifest, &out).is_err());
        assert!(!out.exists());
    }
}

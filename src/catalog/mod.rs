//! Audio clip discovery and cataloging.
//!
//! A catalog turns a set of named, role-tagged source directories into
//! sorted lists of [`Clip`]s with stable identities. Discovery order never
//! depends on filesystem iteration order.

mod probe;

pub use probe::{ClipMeta, probe_clip};

use crate::constants::AUDIO_EXTENSIONS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

/// Role of a source directory in training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    /// Clips containing the wake phrase.
    Positive,
    /// Clips guaranteed not to contain the wake phrase.
    Negative,
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// A named, role-tagged directory of clips.
///
/// The role is fixed for the source's lifetime.
#[derive(Debug, Clone)]
pub struct Source {
    /// Source name, used as the per-source key in manifests.
    pub name: String,
    /// Directory holding the source's clips.
    pub dir: PathBuf,
    /// Role of every clip in this source.
    pub role: SourceRole,
}

impl Source {
    /// Create a source with an explicit name.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, role: SourceRole) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            role,
        }
    }

    /// Derive a source from a directory path, naming it after the final
    /// path component.
    pub fn from_dir(dir: impl Into<PathBuf>, role: SourceRole) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map_or_else(|| dir.to_string_lossy().into_owned(), |n| {
                n.to_string_lossy().into_owned()
            });
        Self { name, dir, role }
    }
}

/// One audio file treated as an atomic unit of training/evaluation data.
///
/// Clips are immutable once cataloged. Re-cataloging the same unchanged
/// path yields the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Stable identity derived from the (path, mtime, size) triple.
    pub id: String,
    /// Name of the source this clip belongs to.
    pub source: String,
    /// Path to the audio file.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_seconds: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// All usable clips of one source, in path-sorted order.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    /// The scanned source.
    pub source: Source,
    /// Usable clips, sorted by path.
    pub clips: Vec<Clip>,
}

/// Scan sources into per-source clip catalogs.
///
/// Fatal errors: a missing source directory, or a source whose usable clip
/// count is zero. Individual clips that fail to probe are skipped with a
/// warning. The returned catalogs are sorted by source name.
pub fn scan(sources: &[Source]) -> Result<Vec<SourceCatalog>> {
    let mut catalogs = Vec::with_capacity(sources.len());

    for source in sources {
        if !source.dir.is_dir() {
            return Err(Error::SourceDirMissing {
                name: source.name.clone(),
                path: source.dir.clone(),
            });
        }

        let files = collect_audio_files(&source.dir)?;
        let mut clips = Vec::with_capacity(files.len());
        for path in files {
            match catalog_clip(source, &path) {
                Ok(clip) => clips.push(clip),
                Err(e) => {
                    warn!("Skipping unreadable clip {}: {e}", path.display());
                }
            }
        }

        if clips.is_empty() {
            return Err(Error::EmptySource {
                name: source.name.clone(),
                path: source.dir.clone(),
            });
        }

        debug!(
            "Cataloged {} clip(s) from {} source '{}'",
            clips.len(),
            source.role,
            source.name
        );
        catalogs.push(SourceCatalog {
            source: source.clone(),
            clips,
        });
    }

    catalogs.sort_by(|a, b| a.source.name.cmp(&b.source.name));
    Ok(catalogs)
}

/// Probe one file and build its [`Clip`].
fn catalog_clip(source: &Source, path: &Path) -> Result<Clip> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::ClipProbe {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    let meta = probe_clip(path)?;

    Ok(Clip {
        id: clip_id(path, &metadata),
        source: source.name.clone(),
        path: path.to_path_buf(),
        duration_seconds: meta.duration_seconds,
        sample_rate: meta.sample_rate,
        channels: meta.channels,
    })
}

/// Stable clip identity from the (path, mtime, size) triple.
///
/// Using file metadata instead of content keeps re-cataloging cheap while
/// staying stable across runs for unchanged files.
pub fn clip_id(path: &Path, metadata: &std::fs::Metadata) -> String {
    use std::fmt::Write;

    let mtime_secs = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());

    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(b"|");
    hasher.update(mtime_secs.to_le_bytes());
    hasher.update(b"|");
    hasher.update(metadata.len().to_le_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Recursively collect audio files under a directory, sorted by path.
fn collect_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_audio_files_recursive(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_audio_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_audio_files_recursive(&path, files)?;
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file has a recognized audio extension.
fn is_audio_file(path: &Path) -> bool {
    use std::ffi::OsStr;

    path.extension().is_some_and(|ext| {
        // Compare extension directly as OsStr to handle non-UTF-8 filenames
        AUDIO_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(OsStr::new(known)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_wav(dir: &Path, name: &str, seconds: f32) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = (seconds * 16000.0) as usize;
        for i in 0..samples {
            #[allow(clippy::cast_possible_truncation)]
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("test.wav")));
        assert!(is_audio_file(Path::new("test.FLAC")));
        assert!(is_audio_file(Path::new("test.mp3")));
        assert!(!is_audio_file(Path::new("test.txt")));
        assert!(!is_audio_file(Path::new("test")));
    }

    #[test]
    fn test_scan_sorted_and_probed() {
        let dir = TempDir::new().unwrap();
        write_wav(dir.path(), "b.wav", 1.0);
        write_wav(dir.path(), "a.wav", 2.0);

        let source = Source::new("neg", dir.path(), SourceRole::Negative);
        let catalogs = scan(std::slice::from_ref(&source)).unwrap();
        assert_eq!(catalogs.len(), 1);

        let clips = &catalogs[0].clips;
        assert_eq!(clips.len(), 2);
        assert!(clips[0].path.ends_with("a.wav"));
        assert!(clips[1].path.ends_with("b.wav"));
        assert!((clips[0].duration_seconds - 2.0).abs() < 0.01);
        assert_eq!(clips[0].sample_rate, 16000);
        assert_eq!(clips[0].channels, 1);
    }

    #[test]
    fn test_scan_skips_corrupt_clip() {
        let dir = TempDir::new().unwrap();
        write_wav(dir.path(), "good.wav", 1.0);
        let mut bad = File::create(dir.path().join("bad.wav")).unwrap();
        bad.write_all(b"not a wav file").unwrap();

        let source = Source::new("neg", dir.path(), SourceRole::Negative);
        let catalogs = scan(std::slice::from_ref(&source)).unwrap();
        assert_eq!(catalogs[0].clips.len(), 1);
        assert!(catalogs[0].clips[0].path.ends_with("good.wav"));
    }

    #[test]
    fn test_scan_missing_dir_is_fatal() {
        let source = Source::new("pos", "/nonexistent/wakeloop/dir", SourceRole::Positive);
        let result = scan(std::slice::from_ref(&source));
        assert!(matches!(result, Err(Error::SourceDirMissing { .. })));
    }

    #[test]
    fn test_scan_empty_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut bad = File::create(dir.path().join("only.wav")).unwrap();
        bad.write_all(b"garbage").unwrap();

        let source = Source::new("pos", dir.path(), SourceRole::Positive);
        let result = scan(std::slice::from_ref(&source));
        assert!(matches!(result, Err(Error::EmptySource { .. })));
    }

    #[test]
    fn test_clip_id_stable_across_scans() {
        let dir = TempDir::new().unwrap();
        write_wav(dir.path(), "clip.wav", 1.0);

        let source = Source::new("neg", dir.path(), SourceRole::Negative);
        let first = scan(std::slice::from_ref(&source)).unwrap();
        let second = scan(std::slice::from_ref(&source)).unwrap();
        assert_eq!(first[0].clips[0].id, second[0].clips[0].id);
        assert_eq!(first[0].clips[0].id.len(), 16);
    }

    #[test]
    fn test_source_from_dir_names_after_component() {
        let source = Source::from_dir("/data/pools/street_noise", SourceRole::Negative);
        assert_eq!(source.name, "street_noise");
        assert_eq!(source.role, SourceRole::Negative);
    }
}

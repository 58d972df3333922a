//! External detector scoring seam.
//!
//! The neural network and its runtime belong to the training framework;
//! this module only defines the contract and a subprocess-backed
//! implementation of it.

use crate::catalog::Clip;
use crate::constants::OOM_EXIT_CODE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Per-frame score stream returned by the detector for one clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTrack {
    /// Frame rate of the score stream in Hz.
    pub frame_rate_hz: f32,
    /// One detection score per frame, in clip order.
    pub scores: Vec<f32>,
}

impl ScoreTrack {
    /// Highest score in the track, 0.0 for an empty track.
    pub fn peak(&self) -> f32 {
        self.scores.iter().copied().fold(0.0, f32::max)
    }
}

/// Scores clips with a trained detector.
///
/// Implementations own the model runtime; the evaluator only sees score
/// tracks.
pub trait DetectorRunner {
    /// Score a clip, returning the detector's frame-score stream.
    fn score_clip(&self, clip: &Clip) -> impl Future<Output = Result<ScoreTrack>> + Send;
}

/// Runs the training framework's scorer as a subprocess.
///
/// Contract: `<scorer> <model_path> <clip_path>` writes a JSON
/// [`ScoreTrack`] to stdout. The child is killed if the caller's timeout
/// drops the in-flight future.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    model: PathBuf,
}

impl CommandRunner {
    /// Create a runner for a scorer program and model artifact.
    ///
    /// The model file must exist; a missing artifact is a fatal
    /// configuration error, not a per-clip one.
    pub fn new(program: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Result<Self> {
        let model = model.into();
        if !model.is_file() {
            return Err(Error::ModelFileNotFound { path: model });
        }
        Ok(Self {
            program: program.into(),
            model,
        })
    }

    /// Path to the model artifact this runner scores with.
    pub fn model_path(&self) -> &Path {
        &self.model
    }
}

impl DetectorRunner for CommandRunner {
    async fn score_clip(&self, clip: &Clip) -> Result<ScoreTrack> {
        let output = tokio::process::Command::new(&self.program)
            .arg(&self.model)
            .arg(&clip.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::ScorerSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            if exit_code(&output.status) == Some(OOM_EXIT_CODE) {
                return Err(Error::ResourceExhausted {
                    clip: clip.path.clone(),
                });
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ScorerFailed {
                clip: clip.path.clone(),
                message: format!("{} ({})", output.status, stderr.trim()),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| Error::ScorerOutput {
            clip: clip.path.clone(),
            source: e,
        })
    }
}

/// Exit code of a finished child, folding a fatal signal into the
/// conventional 128+signal form so OOM kills are recognizable on unix.
fn exit_code(status: &std::process::ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(128 + signal);
        }
    }
    status.code()
}

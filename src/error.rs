//! Error types for wakeloop.

/// Result type alias for wakeloop operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for wakeloop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// A source directory does not exist.
    #[error("source directory for '{name}' does not exist: {path}")]
    SourceDirMissing {
        /// Name of the source.
        name: String,
        /// Path that was expected to exist.
        path: std::path::PathBuf,
    },

    /// A source directory contains no usable clips.
    #[error("source '{name}' has no usable audio clips: {path}")]
    EmptySource {
        /// Name of the source.
        name: String,
        /// Directory that was scanned.
        path: std::path::PathBuf,
    },

    /// A source cannot satisfy the per-source minimum.
    #[error(
        "source '{name}' has {available} usable clip(s) but the per-source minimum is {floor}"
    )]
    FloorViolation {
        /// Name of the offending source.
        name: String,
        /// Number of usable clips in the source.
        available: usize,
        /// Required per-source floor.
        floor: usize,
    },

    /// The sum of per-source floors exceeds the role cap.
    #[error(
        "per-source minimums for {role} sources total {floor_total}, which exceeds the cap of {cap}"
    )]
    ContradictoryQuota {
        /// Role whose quota is contradictory.
        role: crate::catalog::SourceRole,
        /// Sum of per-source floors.
        floor_total: usize,
        /// Configured role cap.
        cap: usize,
    },

    /// A role has no eligible sources at all.
    #[error("no eligible {role} sources configured")]
    NoEligibleSources {
        /// Role with no sources.
        role: crate::catalog::SourceRole,
    },

    /// Selection produced an empty class; the manifest must not reach the trainer.
    #[error(
        "selection produced an empty class ({positives} positives, {negatives} negatives); refusing to write manifest"
    )]
    EmptyClass {
        /// Selected positive count.
        positives: usize,
        /// Selected negative count.
        negatives: usize,
    },

    /// Failed to probe a clip's audio metadata.
    #[error("failed to probe audio clip '{path}'")]
    ClipProbe {
        /// Path to the clip.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write manifest file.
    #[error("failed to write manifest '{path}'")]
    ManifestWrite {
        /// Path to the manifest file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize manifest.
    #[error("failed to serialize manifest")]
    ManifestSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write evaluation report.
    #[error("failed to write evaluation report '{path}'")]
    ReportWrite {
        /// Path to the report file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize evaluation report.
    #[error("failed to serialize evaluation report")]
    ReportSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Model artifact does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to spawn the external scorer process.
    #[error("failed to spawn scorer '{program}'")]
    ScorerSpawn {
        /// Scorer program path.
        program: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The external scorer exited with a failure status.
    #[error("scorer failed on '{clip}': {message}")]
    ScorerFailed {
        /// Clip that was being scored.
        clip: std::path::PathBuf,
        /// Exit status and trimmed stderr.
        message: String,
    },

    /// The external scorer produced unparseable output.
    #[error("scorer produced invalid output for '{clip}'")]
    ScorerOutput {
        /// Clip that was being scored.
        clip: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The external scorer was killed by the resource-exhaustion signal.
    #[error("scorer was killed (resource exhaustion) while scoring '{clip}'")]
    ResourceExhausted {
        /// Clip that was being scored.
        clip: std::path::PathBuf,
    },

    /// Hard-negative pool is locked by another process.
    #[error("hard-negative pool is locked by another process: {path}")]
    PoolLocked {
        /// Path to the lock file.
        path: std::path::PathBuf,
    },

    /// Failed to create pool lock file.
    #[error("failed to create lock file '{path}'")]
    LockCreate {
        /// Path to the lock file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove pool lock file.
    #[error("failed to remove lock file '{path}'")]
    LockRemove {
        /// Path to the lock file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure against the hard-negative pool.
    #[error("hard-negative pool I/O failed at '{path}'")]
    PoolIo {
        /// Path involved in the failure.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a run directory.
    #[error("failed to create run directory under '{path}'")]
    RunDirCreate {
        /// Output root that was being populated.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

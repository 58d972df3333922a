//! Closed-loop evaluation against a trained detector.
//!
//! Feeds held-out positive and negative clips through the external
//! detector, computes recall and a duration-normalized false-alarm rate,
//! and flags the clips responsible for false accepts so the miner can
//! promote them into the next round's negative pool.

mod evaluator;
mod progress;
mod report;
mod retry;
mod runner;

pub use evaluator::{EvalConfig, evaluate};
pub use report::{EvaluationReport, FalseAcceptEvent, write_report};
pub use retry::RetryPolicy;
pub use runner::{CommandRunner, DetectorRunner, ScoreTrack};

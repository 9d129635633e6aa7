//! # easeflow
//!
//! A cancellable property-tweening engine for desktop widget toolkits.
//!
//! Controls hand the engine a start value, an end value, timing with a
//! Bezier easing curve, and a sink that writes each intermediate value back
//! to the control. The engine steps through time at the requested frame
//! rate on an async task and stops early when its cancellation handle fires.

pub mod animation;
pub mod core;
pub mod prelude;
pub mod runtime;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{AnimationOptions, AnimationProfile, Interaction, InteractionConfig},
    geo::{Color, Point, Size},
};

pub use animation::{
    curve::EasingCurve,
    interpolation::{Interpolatable, Interpolation, Value, ValueKind},
    registry::{PropertyKey, TransitionRegistry},
    transitions::{
        CancellationHandle, RunningHandle, TransitionDriver, TransitionOutcome, TransitionState,
    },
    tweening::{AnimationSpec, SinkError, StepPlan, TransitionRequest},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid animation spec: {0}")]
    InvalidSpec(String),

    #[error("Mismatched value kinds: start is {start}, end is {end}")]
    MismatchedValueKind { start: ValueKind, end: ValueKind },

    #[error("Unsupported value kind: {0}")]
    UnsupportedValueKind(String),

    #[error("Easing curve needs at least 2 control points, got {0}")]
    CurveDegenerate(usize),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Transition cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Install `env_logger` as the `log` backend; later calls are no-ops
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

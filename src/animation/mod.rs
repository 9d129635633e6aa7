pub mod curve;
pub mod interpolation;
pub mod registry;
pub mod transitions;
pub mod tweening;

// Re-export commonly used types and functions for convenience
pub use curve::EasingCurve;
pub use interpolation::{Interpolatable, Interpolation, Value, ValueKind};
pub use registry::{PropertyKey, TransitionRegistry};
pub use transitions::{RunningHandle, TransitionDriver, TransitionOutcome, TransitionState};
pub use tweening::{AnimationSpec, StepPlan, TransitionRequest};

use crate::animation::curve::EasingCurve;
use crate::animation::interpolation::Value;
use crate::animation::transitions::CancellationHandle;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timing and easing shared by any number of transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub duration_ms: u64,
    pub frames_per_second: u32,
    #[serde(default)]
    pub easing: EasingCurve,
}

impl AnimationSpec {
    pub fn new(duration_ms: u64, frames_per_second: u32, easing: EasingCurve) -> Self {
        Self {
            duration_ms,
            frames_per_second,
            easing,
        }
    }

    /// Linear timing, for requests that never consult the curve
    pub fn linear(duration_ms: u64, frames_per_second: u32) -> Self {
        Self::new(duration_ms, frames_per_second, EasingCurve::linear())
    }

    pub fn with_easing(mut self, easing: EasingCurve) -> Self {
        self.easing = easing;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_ms == 0 {
            return Err(Error::InvalidSpec("duration must be positive".to_string()));
        }
        if self.frames_per_second == 0 {
            return Err(Error::InvalidSpec(
                "frame rate must be positive".to_string(),
            ));
        }
        self.easing.validate()
    }

    /// Fixed interval between steps
    pub fn step_ms(&self) -> f64 {
        1000.0 / self.frames_per_second as f64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Frame schedule derived from an [`AnimationSpec`].
///
/// Step `k` is delivered at `k * step_ms` (capped at the duration) with
/// elapsed fraction `min(1, k * step_ms / duration_ms)`. The exact end value
/// follows the last step at the full duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    duration_ms: u64,
    frames_per_second: u32,
    step_count: usize,
}

impl StepPlan {
    pub fn new(spec: &AnimationSpec) -> Self {
        let duration_ms = spec.duration_ms;
        let fps = spec.frames_per_second as u64;
        // ceil(duration / (1000 / fps)) in integers, so exact multiples don't round up
        let step_count = duration_ms.saturating_mul(fps).div_ceil(1000) as usize;
        Self {
            duration_ms,
            frames_per_second: spec.frames_per_second,
            step_count,
        }
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn step_ms(&self) -> f64 {
        1000.0 / self.frames_per_second as f64
    }

    /// Elapsed-time fraction for `step`
    pub fn fraction(&self, step: usize) -> f64 {
        if self.duration_ms == 0 || self.frames_per_second == 0 {
            return 1.0;
        }
        let elapsed = step as f64 * 1000.0;
        let total = self.frames_per_second as f64 * self.duration_ms as f64;
        (elapsed / total).min(1.0)
    }

    /// Time since start at which `step` is delivered; `step_count` maps to the full duration
    pub fn offset(&self, step: usize) -> Duration {
        let ms = (step as f64 * self.step_ms()).min(self.duration_ms as f64);
        Duration::from_micros((ms * 1000.0).round() as u64)
    }

    /// Elapsed fractions of every interpolated step, excluding the final landing
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.step_count).map(move |step| self.fraction(step))
    }
}

/// Failure reported by a sink; terminates the transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Destination of every interpolated value
pub type Sink = Box<dyn FnMut(Value) -> std::result::Result<(), SinkError> + Send>;

/// One start-to-end transition of a single property
pub struct TransitionRequest {
    pub start_value: Value,
    pub end_value: Value,
    pub spec: AnimationSpec,
    /// `false` interpolates linearly and ignores the curve shape
    pub use_easing: bool,
    pub cancellation: CancellationHandle,
    pub(crate) sink: Sink,
}

impl TransitionRequest {
    /// Create a request with an infallible sink
    pub fn new<F>(
        start_value: impl Into<Value>,
        end_value: impl Into<Value>,
        spec: AnimationSpec,
        mut sink: F,
    ) -> Self
    where
        F: FnMut(Value) + Send + 'static,
    {
        Self::fallible(start_value, end_value, spec, move |value| {
            sink(value);
            Ok(())
        })
    }

    /// Create a request whose sink may reject a value
    pub fn fallible<F>(
        start_value: impl Into<Value>,
        end_value: impl Into<Value>,
        spec: AnimationSpec,
        sink: F,
    ) -> Self
    where
        F: FnMut(Value) -> std::result::Result<(), SinkError> + Send + 'static,
    {
        Self {
            start_value: start_value.into(),
            end_value: end_value.into(),
            spec,
            use_easing: true,
            cancellation: CancellationHandle::new(),
            sink: Box::new(sink),
        }
    }

    pub fn with_easing(mut self, use_easing: bool) -> Self {
        self.use_easing = use_easing;
        self
    }

    /// Interpolate linearly regardless of the easing curve
    pub fn linear(self) -> Self {
        self.with_easing(false)
    }

    /// Share a caller-owned cancellation handle
    pub fn with_cancellation(mut self, cancellation: CancellationHandle) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Eased progress for an elapsed fraction
    pub fn progress_at(&self, x: f64) -> f64 {
        if self.use_easing {
            self.spec.easing.evaluate(x)
        } else {
            x
        }
    }
}

impl fmt::Debug for TransitionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRequest")
            .field("start_value", &self.start_value)
            .field("end_value", &self.end_value)
            .field("spec", &self.spec)
            .field("use_easing", &self.use_easing)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

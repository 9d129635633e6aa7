//! Prelude module for common easeflow types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use easeflow::prelude::*;`

pub use crate::core::{
    config::{AnimationOptions, AnimationProfile, Interaction, InteractionConfig},
    geo::{Color, Point, Size},
};

pub use crate::animation::{
    curve::EasingCurve,
    interpolation::{Interpolatable, Interpolation, Value, ValueKind},
    registry::{PropertyKey, TransitionRegistry},
    transitions::{
        CancellationHandle, RunningHandle, TransitionDriver, TransitionOutcome, TransitionState,
    },
    tweening::{AnimationSpec, Sink, SinkError, StepPlan, TransitionRequest},
};

pub use crate::runtime::{
    delay, delay_until, init_runtime, runtime, spawn, AsyncHandle, AsyncSpawner,
};

pub use crate::{Error as EaseflowError, Result};

pub use std::{sync::Arc, time::Duration};

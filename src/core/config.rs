//! Configuration system for widget transition timing
//!
//! This module provides a hierarchical configuration system that lets a
//! widget library pick transition timing and easing per interaction kind,
//! either through presets or through custom options loaded from JSON.

use crate::animation::curve::EasingCurve;
use crate::animation::tweening::AnimationSpec;
use crate::core::constants::{
    DEFAULT_FRAMES_PER_SECOND, DEFAULT_HOVER_DURATION_MS, DEFAULT_OPEN_CLOSE_DURATION_MS,
    DEFAULT_PRESS_DURATION_MS, DEFAULT_RESIZE_DURATION_MS,
};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Interaction kinds that trigger a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Hover,
    Press,
    Resize,
    OpenClose,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AnimationProfile {
    #[default]
    Balanced,
    Snappy,
    Smooth,
    Disabled,
    Custom(AnimationOptions),
}

impl AnimationProfile {
    pub fn resolve(&self) -> AnimationOptions {
        match self {
            Self::Balanced => AnimationOptions {
                frames_per_second: DEFAULT_FRAMES_PER_SECOND,
                hover: InteractionConfig::eased(DEFAULT_HOVER_DURATION_MS, EasingCurve::ease_out()),
                press: InteractionConfig::eased(DEFAULT_PRESS_DURATION_MS, EasingCurve::ease_out()),
                resize: InteractionConfig::eased(
                    DEFAULT_RESIZE_DURATION_MS,
                    EasingCurve::ease_in_out(),
                ),
                open_close: InteractionConfig::eased(
                    DEFAULT_OPEN_CLOSE_DURATION_MS,
                    EasingCurve::ease(),
                ),
            },
            Self::Snappy => AnimationOptions {
                frames_per_second: 60,
                hover: InteractionConfig::eased(80, EasingCurve::ease_out()),
                press: InteractionConfig::eased(50, EasingCurve::linear()),
                resize: InteractionConfig::eased(120, EasingCurve::ease_out()),
                open_close: InteractionConfig::eased(150, EasingCurve::back_out()),
            },
            Self::Smooth => AnimationOptions {
                frames_per_second: 120,
                hover: InteractionConfig::eased(250, EasingCurve::ease_in_out()),
                press: InteractionConfig::eased(150, EasingCurve::ease_out()),
                resize: InteractionConfig::eased(400, EasingCurve::ease_in_out()),
                open_close: InteractionConfig::eased(350, EasingCurve::back_out()),
            },
            Self::Disabled => AnimationOptions {
                frames_per_second: DEFAULT_FRAMES_PER_SECOND,
                hover: InteractionConfig::immediate(),
                press: InteractionConfig::immediate(),
                resize: InteractionConfig::immediate(),
                open_close: InteractionConfig::immediate(),
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationOptions {
    pub frames_per_second: u32,
    pub hover: InteractionConfig,
    pub press: InteractionConfig,
    pub resize: InteractionConfig,
    pub open_close: InteractionConfig,
}

impl AnimationOptions {
    /// Parse options from JSON; the result is validated before it is returned
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn interaction(&self, interaction: Interaction) -> &InteractionConfig {
        match interaction {
            Interaction::Hover => &self.hover,
            Interaction::Press => &self.press,
            Interaction::Resize => &self.resize,
            Interaction::OpenClose => &self.open_close,
        }
    }

    /// Spec for one interaction kind at this frame rate
    pub fn spec(&self, interaction: Interaction) -> AnimationSpec {
        self.interaction(interaction).spec(self.frames_per_second)
    }

    pub fn use_easing(&self, interaction: Interaction) -> bool {
        self.interaction(interaction).use_easing
    }

    pub fn validate(&self) -> Result<()> {
        for interaction in [
            Interaction::Hover,
            Interaction::Press,
            Interaction::Resize,
            Interaction::OpenClose,
        ] {
            self.spec(interaction).validate()?;
        }
        Ok(())
    }
}

impl Default for AnimationOptions {
    fn default() -> Self {
        AnimationProfile::default().resolve()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: EasingCurve,
    #[serde(default = "default_use_easing")]
    pub use_easing: bool,
}

fn default_use_easing() -> bool {
    true
}

impl InteractionConfig {
    pub fn eased(duration_ms: u64, easing: EasingCurve) -> Self {
        Self {
            duration_ms,
            easing,
            use_easing: true,
        }
    }

    /// Jump to the end value on the next frame
    pub fn immediate() -> Self {
        Self {
            duration_ms: 1,
            easing: EasingCurve::linear(),
            use_easing: false,
        }
    }

    pub fn spec(&self, frames_per_second: u32) -> AnimationSpec {
        AnimationSpec::new(self.duration_ms, frames_per_second, self.easing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_presets_are_valid() {
        for profile in [
            AnimationProfile::Balanced,
            AnimationProfile::Snappy,
            AnimationProfile::Smooth,
            AnimationProfile::Disabled,
        ] {
            assert!(profile.resolve().validate().is_ok(), "{:?}", profile);
        }
    }

    #[test]
    fn test_disabled_profile_skips_easing() {
        let options = AnimationProfile::Disabled.resolve();
        assert!(!options.use_easing(Interaction::Hover));
        assert_eq!(options.spec(Interaction::Resize).duration_ms, 1);
    }

    #[test]
    fn test_custom_profile_round_trips() {
        let mut custom = AnimationOptions::default();
        custom.hover.duration_ms = 42;
        let profile = AnimationProfile::Custom(custom.clone());
        assert_eq!(profile.resolve(), custom);

        let json = custom.to_json().unwrap();
        assert_eq!(AnimationOptions::from_json(&json).unwrap(), custom);
    }

    #[test]
    fn test_from_json_rejects_invalid_timing() {
        let mut options = AnimationOptions::default();
        options.press.duration_ms = 0;
        let json = serde_json::to_string(&options).unwrap();
        assert!(matches!(
            AnimationOptions::from_json(&json),
            Err(Error::InvalidSpec(_))
        ));

        assert!(matches!(
            AnimationOptions::from_json("{not json"),
            Err(Error::Config(_))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::interpolation::InterpolationMode;

/// Keyframes per second used when none is configured
pub const DEFAULT_KEYFRAMES_PER_SECOND: f32 = 1.0;

/// Options controlling animation playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    /// Rotation interpolation between keyframes
    pub interpolation: InterpolationMode,
    /// Playback rate; one keyframe segment lasts `1 / keyframes_per_second` seconds
    pub keyframes_per_second: f32,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            interpolation: InterpolationMode::Linear,
            keyframes_per_second: DEFAULT_KEYFRAMES_PER_SECOND,
        }
    }
}

impl AnimationOptions {
    /// Set the interpolation mode
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the playback rate; non-positive or non-finite rates fall back to the default
    pub fn with_keyframes_per_second(mut self, rate: f32) -> Self {
        self.keyframes_per_second = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            log::warn!("Ignoring playback rate {rate}, using {DEFAULT_KEYFRAMES_PER_SECOND}");
            DEFAULT_KEYFRAMES_PER_SECOND
        };
        self
    }

    /// Convert playback seconds into keyframe time
    pub fn keyframe_time(&self, seconds: f32) -> f32 {
        seconds * self.keyframes_per_second
    }
}

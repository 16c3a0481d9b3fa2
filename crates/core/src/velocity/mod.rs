use serde::{Deserialize, Serialize};

use crate::{Ease, ScrollSample, Transition, VelocityConfig};

/// Target state of the fast-scroll distortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    pub skew_y: f64,
    pub hue_rotate: f64,
    /// How long the tween toward this state should take.
    pub transition_secs: f64,
}

impl Distortion {
    pub fn is_identity(&self) -> bool {
        self.skew_y == 0.0 && self.hue_rotate == 0.0
    }

    pub fn transition(&self) -> Transition {
        Transition::new(self.transition_secs, Ease::default())
    }
}

/// Maps per-frame scroll speed to a skew + hue shift.
///
/// Only the previous smoothed offset is remembered; the output depends on
/// nothing else.
#[derive(Debug, Clone)]
pub struct VelocityEffect {
    config: VelocityConfig,
    previous: Option<f64>,
}

impl VelocityEffect {
    pub fn new(config: VelocityConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    pub fn observe(&mut self, sample: &ScrollSample) -> Distortion {
        self.observe_offset(sample.smoothed_offset)
    }

    pub fn observe_offset(&mut self, smoothed_offset: f64) -> Distortion {
        let previous = self.previous.replace(smoothed_offset).unwrap_or(smoothed_offset);
        self.distortion_for((smoothed_offset - previous).abs())
    }

    pub fn distortion_for(&self, velocity: f64) -> Distortion {
        if velocity > self.config.threshold {
            Distortion {
                skew_y: velocity * self.config.skew_per_unit,
                hue_rotate: self.config.hue_rotate_deg,
                transition_secs: self.config.attack_secs,
            }
        } else {
            Distortion {
                skew_y: 0.0,
                hue_rotate: 0.0,
                transition_secs: self.config.release_secs,
            }
        }
    }
}

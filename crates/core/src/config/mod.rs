use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Ease, EaseMode, MotionError, Result};

/// Top-level configuration structure for the motion stage.
///
/// Every field has a default so a config file only needs to name what it
/// overrides. Values are read once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub scroll: ScrollConfig,
    pub velocity: VelocityConfig,
    pub preloader: PreloaderConfig,
    pub cursor: CursorConfig,
    pub theme: ThemeConfig,
}

impl SiteConfig {
    /// Loads a JSON config file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scroll.duration_secs.is_nan() || self.scroll.duration_secs < 0.0 {
            return Err(MotionError::config("scroll.duration_secs must be >= 0"));
        }
        if self.velocity.threshold.is_nan() || self.velocity.threshold < 0.0 {
            return Err(MotionError::config("velocity.threshold must be >= 0"));
        }
        if self.preloader.tick_interval_ms == 0 {
            return Err(MotionError::config("preloader.tick_interval_ms must be > 0"));
        }
        match self.preloader.policy {
            IncrementPolicy::Fixed { step } if step == 0 => {
                Err(MotionError::config("preloader fixed step must be > 0"))
            }
            IncrementPolicy::Random { min, max } if min == 0 || min > max => Err(
                MotionError::config("preloader random range must satisfy 1 <= min <= max"),
            ),
            _ => Ok(()),
        }
    }
}

/// Smooth scrolling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// When false the smoothed offset follows the raw offset directly.
    pub smooth: bool,
    /// Length of one catch-up transition in seconds.
    pub duration_secs: f64,
    pub ease: Ease,
    /// Multiplier applied to wheel deltas before they move the target.
    pub wheel_multiplier: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth: true,
            duration_secs: 1.2,
            ease: Ease::ExpoOut,
            wheel_multiplier: 1.0,
        }
    }
}

/// Fast-scroll distortion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Offset change per frame above which the distortion kicks in.
    pub threshold: f64,
    /// Skew in degrees applied per unit of velocity.
    pub skew_per_unit: f64,
    /// Hue rotation in degrees while distorted.
    pub hue_rotate_deg: f64,
    pub attack_secs: f64,
    pub release_secs: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            threshold: 15.0,
            skew_per_unit: 0.1,
            hue_rotate_deg: 90.0,
            attack_secs: 0.1,
            release_secs: 0.3,
        }
    }
}

/// How far the preloader counter moves on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncrementPolicy {
    /// Uniform integer in `[min, max]`.
    Random { min: u8, max: u8 },
    Fixed { step: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloaderConfig {
    /// Overlay element that slides out once loading completes.
    pub target: String,
    pub policy: IncrementPolicy,
    pub tick_interval_ms: u64,
    /// Time between reaching 100 and the reveal completing.
    pub exit_duration_ms: u64,
    pub exit_ease: Ease,
    /// Seed for the random policy; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        Self::snappy()
    }
}

impl PreloaderConfig {
    /// Random 1..=5 every 50 ms with a one second slide-out.
    pub fn classic() -> Self {
        Self {
            target: ".loader".to_string(),
            policy: IncrementPolicy::Random { min: 1, max: 5 },
            tick_interval_ms: 50,
            exit_duration_ms: 1000,
            exit_ease: Ease::power(4, EaseMode::InOut),
            seed: None,
        }
    }

    /// Fixed +2 every 20 ms with an 800 ms slide-out.
    pub fn snappy() -> Self {
        Self {
            target: ".loader".to_string(),
            policy: IncrementPolicy::Fixed { step: 2 },
            tick_interval_ms: 20,
            exit_duration_ms: 800,
            exit_ease: Ease::CubicBezier {
                x1: 0.76,
                y1: 0.0,
                x2: 0.24,
                y2: 1.0,
            },
            seed: None,
        }
    }
}

/// Custom cursor lag times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub enabled: bool,
    pub dot_secs: f64,
    pub follower_secs: f64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dot_secs: 0.1,
            follower_secs: 0.3,
        }
    }
}

/// Section colour transition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Element the section colours are written to.
    pub target: String,
    pub duration_secs: f64,
    pub ease: Ease,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            target: "body".to_string(),
            duration_secs: 0.5,
            ease: Ease::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_values() {
        let config = SiteConfig::default();
        assert_eq!(config.scroll.duration_secs, 1.2);
        assert_eq!(config.velocity.threshold, 15.0);
        assert_eq!(config.preloader.tick_interval_ms, 20);
        assert_eq!(config.preloader.policy, IncrementPolicy::Fixed { step: 2 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SiteConfig::from_json_str(
            r#"{ "preloader": { "policy": { "kind": "random", "min": 1, "max": 5 }, "tick_interval_ms": 50 } }"#,
        )
        .unwrap();
        assert_eq!(
            config.preloader.policy,
            IncrementPolicy::Random { min: 1, max: 5 }
        );
        assert_eq!(config.preloader.tick_interval_ms, 50);
        assert_eq!(config.preloader.exit_duration_ms, 800);
        assert_eq!(config.scroll, ScrollConfig::default());
    }

    #[test]
    fn rejects_stalling_preloader() {
        let mut config = SiteConfig::default();
        config.preloader.policy = IncrementPolicy::Fixed { step: 0 };
        assert!(matches!(
            config.validate(),
            Err(MotionError::InvalidConfig(_))
        ));

        config.preloader.policy = IncrementPolicy::Random { min: 4, max: 2 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ease_fields_use_names() {
        let json = serde_json::to_value(PreloaderConfig::classic()).unwrap();
        assert_eq!(json["exit_ease"], "power4.inOut");
    }
}

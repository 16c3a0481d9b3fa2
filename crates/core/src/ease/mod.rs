//! Easing curves shared by the scroll smoother, timelines and tweens.
//!
//! Curves map normalised time in `[0, 1]` to normalised progress. Every
//! curve is clamped at both ends so callers can feed raw ratios straight in.
//! Names follow the `family.mode` convention used by web animation tooling
//! (`power3.out`, `power4.inOut`, `expo.out`, `none`) so scene files stay
//! readable.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::MotionError;

/// Which end of the curve carries the acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    /// Straight line; `none` in scene files.
    Linear,
    /// Polynomial ease. `degree` 1..=4 maps to exponents 2..=5.
    Power { degree: u8, mode: EaseMode },
    /// `1 - 2^(-10t)`, reaching exactly 1 at `t = 1`.
    ExpoOut,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for Ease {
    fn default() -> Self {
        Self::Power {
            degree: 1,
            mode: EaseMode::Out,
        }
    }
}

impl Ease {
    pub const fn power(degree: u8, mode: EaseMode) -> Self {
        Self::Power { degree, mode }
    }

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power { degree, mode } => {
                let exponent = i32::from(degree.clamp(1, 4)) + 1;
                match mode {
                    EaseMode::In => t.powi(exponent),
                    EaseMode::Out => 1.0 - (1.0 - t).powi(exponent),
                    EaseMode::InOut => {
                        if t < 0.5 {
                            (2.0 * t).powi(exponent) / 2.0
                        } else {
                            1.0 - (2.0 * (1.0 - t)).powi(exponent) / 2.0
                        }
                    }
                }
            }
            Self::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    (1.0 - 2.0_f64.powf(-10.0 * t)).clamp(0.0, 1.0)
                }
            }
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(t, x1, y1, x2, y2),
        }
    }
}

fn bezier_component(t: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - t;
    3.0 * inv * inv * t * p1 + 3.0 * inv * t * t * p2 + t * t * t
}

fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - t;
    3.0 * inv * inv * p1 + 6.0 * inv * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn cubic_bezier(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton first, bisection when the slope flattens out.
    let mut t = x;
    for _ in 0..8 {
        let err = bezier_component(t, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_component(t, y1, y2);
        }
        let slope = bezier_slope(t, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    for _ in 0..40 {
        let value = bezier_component(t, x1, x2);
        if (value - x).abs() < 1e-7 {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    bezier_component(t, y1, y2)
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("none"),
            Self::Power { degree, mode } => {
                let mode = match mode {
                    EaseMode::In => "in",
                    EaseMode::Out => "out",
                    EaseMode::InOut => "inOut",
                };
                write!(f, "power{degree}.{mode}")
            }
            Self::ExpoOut => f.write_str("expo.out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        }
    }
}

impl FromStr for Ease {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let invalid = || MotionError::InvalidEase(s.to_string());

        if let Some(args) = name
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let values = args
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            let [x1, y1, x2, y2] = values[..] else {
                return Err(invalid());
            };
            if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                return Err(invalid());
            }
            return Ok(Self::CubicBezier { x1, y1, x2, y2 });
        }

        match name {
            "none" | "linear" => return Ok(Self::Linear),
            "expo.out" | "expo" => return Ok(Self::ExpoOut),
            _ => {}
        }

        let (family, mode) = name.split_once('.').unwrap_or((name, "out"));
        let degree = family
            .strip_prefix("power")
            .and_then(|d| d.parse::<u8>().ok())
            .filter(|d| (1..=4).contains(d))
            .ok_or_else(invalid)?;
        let mode = match mode {
            "in" => EaseMode::In,
            "out" => EaseMode::Out,
            "inOut" => EaseMode::InOut,
            _ => return Err(invalid()),
        };
        Ok(Self::Power { degree, mode })
    }
}

impl TryFrom<String> for Ease {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(value: Ease) -> Self {
        value.to_string()
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::MotionError;

/// Visual properties the engine knows how to interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    X,
    Y,
    XPercent,
    YPercent,
    SkewY,
    Rotation,
    Scale,
    Opacity,
    /// `filter: hue-rotate(<deg>)`.
    HueRotate,
    BackgroundColor,
    Color,
}

impl Property {
    /// Value an element has before anything animates it.
    pub fn natural(self) -> Value {
        match self {
            Self::Scale | Self::Opacity => Value::Number(1.0),
            Self::BackgroundColor => Value::Color(Rgb::BLACK),
            Self::Color => Value::Color(Rgb::WHITE),
            _ => Value::Number(0.0),
        }
    }
}

/// 8-bit RGB colour, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        let channel = |a: u8, b: u8| {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::config(format!("invalid colour `{s}`"));
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };
        let value = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
        Ok(Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ))
    }
}

impl TryFrom<String> for Rgb {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A property value: either a plain number or a colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Color(Rgb),
}

impl Value {
    /// Interpolates toward `to`. Mismatched kinds snap at the halfway point.
    pub fn lerp(self, to: Self, t: f64) -> Self {
        match (self, to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(a + (b - a) * t),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(b, t)),
            (from, to) => {
                if t < 0.5 {
                    from
                } else {
                    to
                }
            }
        }
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Color(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Rgb> for Value {
    fn from(value: Rgb) -> Self {
        Self::Color(value)
    }
}

/// One property write for one matched node of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleWrite {
    pub target: String,
    pub index: usize,
    pub property: Property,
    pub value: Value,
}

impl StyleWrite {
    pub fn new(target: impl Into<String>, index: usize, property: Property, value: Value) -> Self {
        Self {
            target: target.into(),
            index,
            property,
            value,
        }
    }
}

/// Result alias that carries the custom [`MotionError`] type.
pub type Result<T> = std::result::Result<T, MotionError>;

/// Common error type for the core crate.
///
/// Everything here is a setup-time defect: a scene that names an element the
/// layout does not know, a bound or ease that does not parse, or a config file
/// that cannot be read. Nothing in the per-frame path returns an error.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    /// A selector in the scene did not match any element in the layout.
    #[error("unresolved target `{0}`")]
    UnresolvedTarget(String),
    /// A trigger bound such as `"top 50%"` could not be parsed.
    #[error("invalid trigger bound `{0}`")]
    InvalidBound(String),
    /// An ease name such as `"power3.out"` is not recognised.
    #[error("invalid ease `{0}`")]
    InvalidEase(String),
    /// A configuration value is outside the range the engine accepts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl MotionError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for MotionError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MotionError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_target_names_the_selector() {
        let err = MotionError::UnresolvedTarget(".tour-card".to_string());
        assert_eq!(err.to_string(), "unresolved target `.tour-card`");
    }

    #[test]
    fn string_conversion_wraps_message() {
        let err: MotionError = "boom".into();
        assert!(matches!(err, MotionError::Message(ref m) if m == "boom"));
    }
}

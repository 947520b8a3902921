use thiserror::Error;

/// Failure taxonomy for the scoring core.
///
/// Degenerate numeric states (zero variance, empty zones, no facilities) are
/// defined behaviour and never surface here.
#[derive(Debug, Error)]
pub enum HcsError {
    /// Unknown intervention kind, missing required input layer, unsupported projection.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A zone set, facility set or statistics entry the computation needs is absent.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Malformed action input or mismatched grid shapes.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("computation failed: {0}")]
    Computation(String),
}

impl HcsError {
    pub(crate) fn missing_layer(layer: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("missing required input layer '{}'", layer))
    }

    pub(crate) fn missing_stats(layer: impl std::fmt::Display) -> Self {
        Self::DataUnavailable(format!("no city statistics for layer '{}'", layer))
    }
}

pub type Result<T> = std::result::Result<T, HcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_pick_the_right_variant() {
        let e = HcsError::missing_layer("no2");
        assert!(matches!(e, HcsError::Configuration(_)));
        assert_eq!(e.to_string(), "configuration error: missing required input layer 'no2'");
        assert!(matches!(HcsError::missing_stats("lst"), HcsError::DataUnavailable(_)));
    }
}

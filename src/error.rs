//! Configuration errors
//!
//! Only construction can fail. Runtime input is sanitized, never rejected.

/// Result alias carrying [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Invalid configuration, rejected when a component is built.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("phase list is empty")]
    NoPhases,
    #[error("first phase must start at 0.0, found {0}")]
    FirstPhaseStart(f32),
    #[error("last phase must end at 1.0, found {0}")]
    LastPhaseEnd(f32),
    #[error("phase `{id}` has bounds [{lower}, {upper}) that are empty or inverted")]
    DegeneratePhase { id: String, lower: f32, upper: f32 },
    #[error("phase `{next}` starts at {lower} but `{prev}` ends at {upper}")]
    PhaseDiscontinuity {
        prev: String,
        next: String,
        upper: f32,
        lower: f32,
    },
    #[error("phase `{id}` easing leaves [0, 1]: {easing}")]
    UnboundedEasing { id: String, easing: String },
    #[error("transition rate must be positive and finite, found {0}")]
    InvalidRate(f32),
    #[error("particle layer `{layer}`: {reason}")]
    InvalidLayer { layer: String, reason: String },
    #[error("camera rig: {0}")]
    InvalidRig(String),
    #[error("orbit tuning: {0}")]
    InvalidOrbit(String),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn layer(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLayer {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    pub fn rig(reason: impl Into<String>) -> Self {
        Self::InvalidRig(reason.into())
    }
}

//! Error types for the motion core.
//!
//! Configuration is the only fallible surface; everything in the step
//! generation path is interrupt-driven and designed not to fail.

use core::fmt;

/// Result type alias using the library's [`ConfigError`].
pub type Result<T> = core::result::Result<T, ConfigError>;

/// Configuration parsing and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// No axes defined
    NoAxes,
    /// Duplicate axis name in configuration
    DuplicateAxisName(heapless::String<16>),
    /// Invalid steps per millimeter (must be > 0)
    InvalidStepsPerMm(f32),
    /// Invalid max velocity (must be > 0)
    InvalidMaxVelocity(f32),
    /// Invalid max acceleration (must be > 0)
    InvalidMaxAcceleration(f32),
    /// Invalid junction deviation (must be >= 0)
    InvalidJunctionDeviation(f32),
    /// Invalid default acceleration (must be > 0)
    InvalidAcceleration(f32),
    /// Invalid step pulse width (must be > 0)
    InvalidPulseWidth(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::NoAxes => write!(f, "No axes defined"),
            ConfigError::DuplicateAxisName(name) => write!(f, "Duplicate axis name: '{}'", name),
            ConfigError::InvalidStepsPerMm(v) => {
                write!(f, "Invalid steps per mm: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxVelocity(v) => {
                write!(f, "Invalid max velocity: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxAcceleration(v) => {
                write!(f, "Invalid max acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidJunctionDeviation(v) => {
                write!(f, "Invalid junction deviation: {}. Must be >= 0", v)
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidPulseWidth(v) => {
                write!(f, "Invalid step pulse width: {} us. Must be > 0", v)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

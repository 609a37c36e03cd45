//! Error types for building a sealed-box system.
//!
//! Only construction can fail. The formula layer never returns errors:
//! out-of-domain inputs come back as non-finite `f64`s.

use thiserror::Error;

/// Rejection reasons for a [`crate::system::SystemConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter is zero, negative, or not finite.
    #[error("parameter '{name}' must be a finite positive number, got {value}")]
    NonPositive {
        /// Parameter name as printed in the datasheet (e.g. "Vas").
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Qts is not below both Qes and Qms, which no physical driver allows.
    #[error("Qts ({qts}) must be smaller than both Qes ({qes}) and Qms ({qms})")]
    QtsOutOfRange {
        /// Total Q.
        qts: f64,
        /// Electrical Q.
        qes: f64,
        /// Mechanical Q.
        qms: f64,
    },

    /// A parameter was never supplied.
    #[error("missing parameter '{name}'")]
    MissingParameter {
        /// Parameter name.
        name: &'static str,
    },

    /// A preset name did not match any bundled driver.
    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset {
        /// The requested name.
        name: String,
        /// Comma-separated list of known presets.
        available: String,
    },
}

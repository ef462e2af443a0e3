//! Common error infrastructure for the workout runtime.
//!
//! Every error enum in the workspace implements [`WorkoutError`] so hosts can
//! decide how to react without matching on concrete variants:
//!
//! - **Configuration** errors are raised synchronously when a behavior or
//!   preset is constructed with invalid parameters. The block is never built.
//! - **Composition** errors come from the validator before activation.
//! - **Hook** errors are absorbed per hook and only logged.
//! - **Missing memory** is never an error: reads return `None`.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The session continues; only one block's turn or display is degraded.
    Recoverable,

    /// Invalid input that must be fixed before retrying (bad parameters,
    /// inconsistent behavior composition).
    Validation,

    /// Unexpected inconsistency inside the runtime. Indicates a bug.
    Internal,

    /// The session cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all workout errors.
pub trait WorkoutError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Invalid behavior or preset parameters.
///
/// Values are never clamped into range; construction fails instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{behavior}: duration must be positive")]
    NonPositiveDuration { behavior: &'static str },

    #[error("rep scheme must contain at least one entry")]
    EmptyRepScheme,

    #[error("rep scheme entry {index} must be positive")]
    ZeroRepCount { index: usize },

    #[error("rep scheme has {scheme} entries but the block runs {rounds} rounds")]
    RepSchemeLengthMismatch { scheme: usize, rounds: u32 },

    #[error("{behavior}: event name must not be empty")]
    EmptyEventName { behavior: &'static str },
}

impl WorkoutError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveDuration { .. } => "CONFIG_NON_POSITIVE_DURATION",
            Self::EmptyRepScheme => "CONFIG_EMPTY_REP_SCHEME",
            Self::ZeroRepCount { .. } => "CONFIG_ZERO_REP_COUNT",
            Self::RepSchemeLengthMismatch { .. } => "CONFIG_REP_SCHEME_LENGTH",
            Self::EmptyEventName { .. } => "CONFIG_EMPTY_EVENT_NAME",
        }
    }
}

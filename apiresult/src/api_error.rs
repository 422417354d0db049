use thiserror::Error;

/// The default message of [`ApiError::ConditionNotSatisfied`].
pub const CONDITION_NOT_SATISFIED: &str = "Condition was not satisfied";

/// The message used when a `None` success is turned into an error.
pub const VALUE_WAS_NONE: &str = "Value was None";

/// Well-known failures produced by the library itself.
///
/// These are the sentinels substituted when a caller asks for an error-shaped
/// result without supplying one, plus a plain message variant for ad-hoc
/// failures built with [`Failure::msg`](crate::Failure::msg).
#[derive(Error, Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ApiError {
    /// A general error with a message describing what went wrong.
    #[error("{0}")]
    Message(String),

    /// A `Loading` value was asked for its outcome.
    #[error("The operation has not finished yet")]
    NotFinished,

    /// A check on a successful value did not hold.
    #[error("{0}")]
    ConditionNotSatisfied(String),
}

impl ApiError {
    pub fn message(message: impl Into<String>) -> Self {
        ApiError::Message(message.into())
    }

    pub fn condition_not_satisfied() -> Self {
        ApiError::ConditionNotSatisfied(CONDITION_NOT_SATISFIED.to_string())
    }

    /// Returns true if this error is a plain message.
    pub fn is_message(&self) -> bool {
        matches!(self, ApiError::Message(_))
    }

    /// Returns true if this error stands for an unfinished operation.
    pub fn is_not_finished(&self) -> bool {
        matches!(self, ApiError::NotFinished)
    }

    /// Returns true if this error stands for a failed check.
    pub fn is_condition_not_satisfied(&self) -> bool {
        matches!(self, ApiError::ConditionNotSatisfied(_))
    }
}

/// Signals that the surrounding task was cancelled.
///
/// `Cancelled` does not implement [`std::error::Error`], so it never converts
/// into a [`Failure`](crate::Failure) and can't end up inside
/// [`ApiResult::Error`](crate::ApiResult::Error). Helpers that can observe
/// cancellation return `Result<_, Cancelled>` for the caller to propagate.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Task was cancelled!")
    }
}

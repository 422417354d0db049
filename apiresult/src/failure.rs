use crate::ApiError;
use std::any::TypeId;
use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// The failure carried by [`ApiResult::Error`](crate::ApiResult::Error).
///
/// A `Failure` wraps any `std::error::Error + Send + Sync + 'static` behind an
/// [`Arc`], so cloning it is cheap and every clone refers to the very same
/// error object. Combinators and accessors hand the original object back,
/// keeping its concrete type (see [`Failure::downcast_ref`]) and its chain of
/// causes (see [`Failure::chain`]) intact.
///
/// Any error type converts into a `Failure` with `?` or [`From`]:
///
/// ```
/// use apiresult::{ApiResult, Failure};
///
/// fn parse(input: &str) -> Result<i32, Failure> {
///     Ok(input.parse::<i32>()?)
/// }
///
/// let result = ApiResult::invoke(|| parse("nope"));
/// assert!(result.failure().is_some_and(|f| f.is::<std::num::ParseIntError>()));
/// ```
#[derive(Clone)]
pub struct Failure {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
    // Concrete type of `inner`; unknown for errors that arrived boxed.
    kind: Option<TypeId>,
}

impl Failure {
    /// Wraps an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Failure {
            inner: Arc::new(error),
            kind: Some(TypeId::of::<E>()),
        }
    }

    /// Wraps an already boxed error value without re-boxing its contents.
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Failure {
            inner: Arc::from(error),
            kind: None,
        }
    }

    /// A plain message failure.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(ApiError::message(message))
    }

    /// The sentinel for an operation that has not completed yet.
    pub fn not_finished() -> Self {
        Self::new(ApiError::NotFinished)
    }

    /// The sentinel for a check on a success value that did not hold.
    pub fn condition_not_satisfied() -> Self {
        Self::new(ApiError::condition_not_satisfied())
    }

    /// Same as [`Failure::condition_not_satisfied`] with a custom message.
    pub fn condition_not_satisfied_with(message: impl Into<String>) -> Self {
        Self::new(ApiError::ConditionNotSatisfied(message.into()))
    }

    /// Returns true if the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.inner.is::<E>()
    }

    /// Returns the wrapped error as `E` if it is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Returns the wrapped error if it is one of the library's own [`ApiError`]s.
    pub fn api_error(&self) -> Option<&ApiError> {
        self.downcast_ref::<ApiError>()
    }

    pub fn is_not_finished(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_finished)
    }

    pub fn is_condition_not_satisfied(&self) -> bool {
        self.api_error()
            .is_some_and(ApiError::is_condition_not_satisfied)
    }

    /// The wrapped error object.
    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    /// The underlying cause of the wrapped error, if it has one.
    pub fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }

    /// Iterates over the wrapped error followed by each of its causes.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let head: &(dyn StdError + 'static) = self.as_error();
        std::iter::successors(Some(head), |&error| error.source())
    }

    /// Returns true if both failures share the same error object.
    pub fn ptr_eq(this: &Failure, other: &Failure) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }

    pub fn into_inner(self) -> Arc<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Failure::new(error)
    }
}

impl From<Failure> for Arc<dyn StdError + Send + Sync + 'static> {
    fn from(failure: Failure) -> Self {
        failure.inner
    }
}

impl From<Failure> for Box<dyn StdError + Send + Sync + 'static> {
    fn from(failure: Failure) -> Self {
        Box::new(SharedError(failure.inner))
    }
}

impl Deref for Failure {
    type Target = dyn StdError + Send + Sync + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Failure").field(&self.inner).finish()
    }
}

/// Same object, or the same error type rebuilt with equal `Debug` renderings.
impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        if Failure::ptr_eq(self, other) {
            return true;
        }
        match (self.kind, other.kind) {
            (Some(kind), Some(other_kind)) if kind == other_kind => {
                format!("{:?}", self.inner) == format!("{:?}", other.inner)
            }
            _ => false,
        }
    }
}

impl Eq for Failure {}

struct SharedError(Arc<dyn StdError + Send + Sync + 'static>);

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for SharedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

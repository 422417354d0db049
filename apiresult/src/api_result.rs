use crate::api_error::VALUE_WAS_NONE;
use crate::{Emptiness, Failure};
use std::error::Error as StdError;

/// The outcome of an operation: a value, a failure, or nothing yet.
///
/// Every combinator consumes the result and returns a new one. `Success` and
/// `Error` never change once built, and a [`Failure`] is only ever replaced by
/// the combinators that say so (`map_error`, `recover`, `recover_if`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ApiResult<T> {
    Loading,
    Success { value: T },
    Error { error: Failure },
}

impl<T> ApiResult<T> {
    pub fn success(value: T) -> Self {
        ApiResult::Success { value }
    }

    pub fn error(error: impl Into<Failure>) -> Self {
        ApiResult::Error {
            error: error.into(),
        }
    }

    pub fn loading() -> Self {
        ApiResult::Loading
    }

    /// Runs `operation` and captures its outcome.
    ///
    /// `Ok` becomes `Success`, `Err` becomes `Error`. A panic inside
    /// `operation` is not caught.
    pub fn invoke<E, F>(operation: F) -> Self
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<Failure>,
    {
        operation().into()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ApiResult::Error { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ApiResult::Loading)
    }

    pub fn value_ref(&self) -> Option<&T> {
        match self {
            ApiResult::Success { value } => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ApiResult::Error { error } => Some(error),
            _ => None,
        }
    }

    pub fn into_failure(self) -> Option<Failure> {
        match self {
            ApiResult::Error { error } => Some(error),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> ApiResult<&T> {
        match self {
            ApiResult::Loading => ApiResult::Loading,
            ApiResult::Success { value } => ApiResult::Success { value },
            ApiResult::Error { error } => ApiResult::Error {
                error: error.clone(),
            },
        }
    }

    /// Returns the value, or the outcome of `on_error`.
    ///
    /// `Loading` calls `on_error` with [`Failure::not_finished`].
    pub fn or_else<F>(self, on_error: F) -> T
    where
        F: FnOnce(Failure) -> T,
    {
        match self {
            ApiResult::Success { value } => value,
            ApiResult::Error { error } => on_error(error),
            ApiResult::Loading => on_error(Failure::not_finished()),
        }
    }

    pub fn or(self, default: T) -> T {
        self.or_else(|_| default)
    }

    pub fn or_default(self) -> T
    where
        T: Default,
    {
        self.or_else(|_| T::default())
    }

    pub fn or_none(self) -> Option<T> {
        match self {
            ApiResult::Success { value } => Some(value),
            _ => None,
        }
    }

    /// Converts into a std `Result`, handing back the original failure object.
    ///
    /// `Loading` turns into the not-finished sentinel.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            ApiResult::Success { value } => Ok(value),
            ApiResult::Error { error } => Err(error),
            ApiResult::Loading => Err(Failure::not_finished()),
        }
    }

    pub fn map<R, F>(self, f: F) -> ApiResult<R>
    where
        F: FnOnce(T) -> R,
    {
        match self {
            ApiResult::Success { value } => ApiResult::Success { value: f(value) },
            ApiResult::Error { error } => ApiResult::Error { error },
            ApiResult::Loading => ApiResult::Loading,
        }
    }

    pub fn map_error<E, F>(self, f: F) -> Self
    where
        F: FnOnce(Failure) -> E,
        E: Into<Failure>,
    {
        match self {
            ApiResult::Error { error } => ApiResult::error(f(error)),
            other => other,
        }
    }

    pub fn map_loading<F>(self, f: F) -> Self
    where
        F: FnOnce() -> T,
    {
        match self {
            ApiResult::Loading => ApiResult::success(f()),
            other => other,
        }
    }

    /// Folds the result into a single value.
    ///
    /// `Loading` is routed through `on_error` with [`Failure::not_finished`];
    /// use [`fold_with_loading`](Self::fold_with_loading) to handle it apart.
    pub fn fold<R, S, E>(self, on_success: S, on_error: E) -> R
    where
        S: FnOnce(T) -> R,
        E: FnOnce(Failure) -> R,
    {
        match self {
            ApiResult::Success { value } => on_success(value),
            ApiResult::Error { error } => on_error(error),
            ApiResult::Loading => on_error(Failure::not_finished()),
        }
    }

    pub fn fold_with_loading<R, S, E, L>(self, on_success: S, on_error: E, on_loading: L) -> R
    where
        S: FnOnce(T) -> R,
        E: FnOnce(Failure) -> R,
        L: FnOnce() -> R,
    {
        match self {
            ApiResult::Success { value } => on_success(value),
            ApiResult::Error { error } => on_error(error),
            ApiResult::Loading => on_loading(),
        }
    }

    /// Like [`map`](Self::map) for a fallible `f`; its `Err` becomes `Error`.
    pub fn try_map<R, E, F>(self, f: F) -> ApiResult<R>
    where
        F: FnOnce(T) -> Result<R, E>,
        E: Into<Failure>,
    {
        self.map(|value| ApiResult::invoke(|| f(value))).flatten()
    }

    pub fn none_on_error(self) -> ApiResult<Option<T>> {
        match self {
            ApiResult::Success { value } => ApiResult::Success { value: Some(value) },
            ApiResult::Error { .. } => ApiResult::Success { value: None },
            ApiResult::Loading => ApiResult::Loading,
        }
    }

    /// Turns a success matching `predicate` into a "condition not satisfied" error.
    pub fn error_if<P>(self, predicate: P) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        self.error_if_with(predicate, Failure::condition_not_satisfied)
    }

    pub fn error_if_with<P, F, E>(self, predicate: P, failure: F) -> Self
    where
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> E,
        E: Into<Failure>,
    {
        match self {
            ApiResult::Success { value } => {
                if predicate(&value) {
                    ApiResult::error(failure())
                } else {
                    ApiResult::Success { value }
                }
            }
            other => other,
        }
    }

    pub fn error_unless<P>(self, predicate: P) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        self.error_unless_with(predicate, Failure::condition_not_satisfied)
    }

    pub fn error_unless_with<P, F, E>(self, predicate: P, failure: F) -> Self
    where
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> E,
        E: Into<Failure>,
    {
        self.error_if_with(|value| !predicate(value), failure)
    }

    pub fn error_if_empty(self) -> Self
    where
        T: Emptiness,
    {
        self.error_if(T::is_empty)
    }

    pub fn error_if_empty_with<F, E>(self, failure: F) -> Self
    where
        T: Emptiness,
        F: FnOnce() -> E,
        E: Into<Failure>,
    {
        self.error_if_with(T::is_empty, failure)
    }

    /// Recovers from a failure of type `E`; other failures are left alone.
    pub fn recover<E, F>(self, f: F) -> Self
    where
        E: StdError + 'static,
        F: FnOnce(&E) -> T,
    {
        match self {
            ApiResult::Error { error } => {
                let recovered = error.downcast_ref::<E>().map(f);
                match recovered {
                    Some(value) => ApiResult::success(value),
                    None => ApiResult::Error { error },
                }
            }
            other => other,
        }
    }

    pub fn recover_if<C, F>(self, condition: C, f: F) -> Self
    where
        C: FnOnce(&Failure) -> bool,
        F: FnOnce(Failure) -> T,
    {
        match self {
            ApiResult::Error { error } => {
                if condition(&error) {
                    ApiResult::success(f(error))
                } else {
                    ApiResult::Error { error }
                }
            }
            other => other,
        }
    }

    /// Gates the value on a dependent check.
    ///
    /// The original value is kept if `another` succeeds. An `Error` or
    /// `Loading` from `another` replaces it. `another` is not called unless
    /// `self` is a success.
    pub fn chain<R, F>(self, another: F) -> Self
    where
        F: FnOnce(&T) -> ApiResult<R>,
    {
        match self {
            ApiResult::Success { value } => match another(&value) {
                ApiResult::Success { .. } => ApiResult::Success { value },
                ApiResult::Error { error } => ApiResult::Error { error },
                ApiResult::Loading => ApiResult::Loading,
            },
            other => other,
        }
    }

    pub fn and_then<R, F>(self, another: F) -> ApiResult<R>
    where
        F: FnOnce(T) -> ApiResult<R>,
    {
        self.map(another).flatten()
    }

    pub fn on_success<F>(self, f: F) -> Self
    where
        F: FnOnce(&T),
    {
        if let ApiResult::Success { value } = &self {
            f(value);
        }
        self
    }

    pub fn on_error<F>(self, f: F) -> Self
    where
        F: FnOnce(&Failure),
    {
        if let ApiResult::Error { error } = &self {
            f(error);
        }
        self
    }

    pub fn on_loading<F>(self, f: F) -> Self
    where
        F: FnOnce(),
    {
        if self.is_loading() {
            f();
        }
        self
    }
}

impl<T> ApiResult<ApiResult<T>> {
    pub fn flatten(self) -> ApiResult<T> {
        match self {
            ApiResult::Success { value } => value,
            ApiResult::Error { error } => ApiResult::Error { error },
            ApiResult::Loading => ApiResult::Loading,
        }
    }
}

impl<T> ApiResult<Option<T>> {
    pub fn error_on_none(self) -> ApiResult<T> {
        self.error_on_none_with(|| Failure::condition_not_satisfied_with(VALUE_WAS_NONE))
    }

    pub fn error_on_none_with<F, E>(self, failure: F) -> ApiResult<T>
    where
        F: FnOnce() -> E,
        E: Into<Failure>,
    {
        match self {
            ApiResult::Success { value: Some(value) } => ApiResult::Success { value },
            ApiResult::Success { value: None } => ApiResult::error(failure()),
            ApiResult::Error { error } => ApiResult::Error { error },
            ApiResult::Loading => ApiResult::Loading,
        }
    }
}

impl<T> Default for ApiResult<T> {
    fn default() -> Self {
        ApiResult::Loading
    }
}

impl<T, E> From<Result<T, E>> for ApiResult<T>
where
    E: Into<Failure>,
{
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(value) => ApiResult::Success { value },
            Err(error) => ApiResult::error(error),
        }
    }
}

impl<T> From<Failure> for ApiResult<T> {
    fn from(error: Failure) -> Self {
        ApiResult::Error { error }
    }
}

impl<T> From<ApiResult<T>> for Result<T, Failure> {
    fn from(value: ApiResult<T>) -> Self {
        value.into_result()
    }
}

/// Merges results: the first error wins, then any loading, else all values.
impl<T, V> FromIterator<ApiResult<T>> for ApiResult<V>
where
    V: FromIterator<T>,
{
    fn from_iter<I: IntoIterator<Item = ApiResult<T>>>(iter: I) -> Self {
        let mut loading = false;
        let mut values = Vec::new();
        for result in iter {
            match result {
                ApiResult::Success { value } => values.push(value),
                ApiResult::Error { error } => return ApiResult::Error { error },
                ApiResult::Loading => loading = true,
            }
        }
        if loading {
            ApiResult::Loading
        } else {
            ApiResult::success(values.into_iter().collect())
        }
    }
}

use crate::api_error::VALUE_WAS_NONE;
use crate::{ApiResult, Failure};

/// Conversion of an operation's raw outcome into an [`ApiResult`].
///
/// The async helpers ([`ApiResult::invoke_async`], [`ApiResult::flow`],
/// [`supervise`](crate::supervise)) accept anything implementing this trait as
/// the output of the wrapped future.
pub trait IntoApiResult<T> {
    fn into_api_result(self) -> ApiResult<T>;
}

impl<T> IntoApiResult<T> for ApiResult<T> {
    fn into_api_result(self) -> ApiResult<T> {
        self
    }
}

impl<T, E> IntoApiResult<T> for Result<T, E>
where
    E: Into<Failure>,
{
    fn into_api_result(self) -> ApiResult<T> {
        match self {
            Ok(value) => ApiResult::success(value),
            Err(error) => ApiResult::error(error),
        }
    }
}

impl<T> IntoApiResult<T> for Option<T> {
    fn into_api_result(self) -> ApiResult<T> {
        match self {
            Some(value) => ApiResult::success(value),
            None => ApiResult::error(Failure::condition_not_satisfied_with(VALUE_WAS_NONE)),
        }
    }
}

impl<T> IntoApiResult<T> for Failure {
    fn into_api_result(self) -> ApiResult<T> {
        ApiResult::Error { error: self }
    }
}

use crate::{ApiResult, Failure};
use std::iter::FilterMap;

/// Lazy, order-preserving combinators over a sequence of [`ApiResult`]s.
pub trait ApiResultIterExt<T>: Iterator<Item = ApiResult<T>> + Sized {
    /// Maps the value of every success.
    fn map_values<R, F>(self, f: F) -> MapValues<Self, F>
    where
        F: FnMut(T) -> R,
    {
        MapValues { iter: self, f }
    }

    /// Maps the failure of every error.
    fn map_errors<E, F>(self, f: F) -> MapErrors<Self, F>
    where
        F: FnMut(Failure) -> E,
        E: Into<Failure>,
    {
        MapErrors { iter: self, f }
    }

    /// Keeps only the values of successes.
    fn successes(self) -> FilterMap<Self, fn(ApiResult<T>) -> Option<T>> {
        self.filter_map(ApiResult::or_none as fn(ApiResult<T>) -> Option<T>)
    }

    /// Keeps only the failures of errors.
    fn errors(self) -> FilterMap<Self, fn(ApiResult<T>) -> Option<Failure>> {
        self.filter_map(ApiResult::into_failure as fn(ApiResult<T>) -> Option<Failure>)
    }
}

impl<T, I> ApiResultIterExt<T> for I where I: Iterator<Item = ApiResult<T>> {}

pub trait ApiResultOptionIterExt<T>: Iterator<Item = ApiResult<Option<T>>> + Sized {
    /// Drops `Success(None)` and unwraps `Success(Some(_))`; errors and
    /// loading pass through.
    fn filter_nones(self) -> FilterMap<Self, fn(ApiResult<Option<T>>) -> Option<ApiResult<T>>> {
        self.filter_map(drop_none as fn(ApiResult<Option<T>>) -> Option<ApiResult<T>>)
    }
}

impl<T, I> ApiResultOptionIterExt<T> for I where I: Iterator<Item = ApiResult<Option<T>>> {}

fn drop_none<T>(result: ApiResult<Option<T>>) -> Option<ApiResult<T>> {
    match result {
        ApiResult::Success { value: Some(value) } => Some(ApiResult::Success { value }),
        ApiResult::Success { value: None } => None,
        ApiResult::Error { error } => Some(ApiResult::Error { error }),
        ApiResult::Loading => Some(ApiResult::Loading),
    }
}

#[derive(Debug, Clone)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct MapValues<I, F> {
    iter: I,
    f: F,
}

impl<T, R, I, F> Iterator for MapValues<I, F>
where
    I: Iterator<Item = ApiResult<T>>,
    F: FnMut(T) -> R,
{
    type Item = ApiResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let f = &mut self.f;
        self.iter.next().map(|result| result.map(f))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

#[derive(Debug, Clone)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct MapErrors<I, F> {
    iter: I,
    f: F,
}

impl<T, E, I, F> Iterator for MapErrors<I, F>
where
    I: Iterator<Item = ApiResult<T>>,
    F: FnMut(Failure) -> E,
    E: Into<Failure>,
{
    type Item = ApiResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let f = &mut self.f;
        self.iter.next().map(|result| result.map_error(f))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

use thiserror::Error;

mod failure_test;
mod single_flight_test;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TestError {
    #[error("network unreachable")]
    Network,
    #[error("invalid input: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
#[error("request failed")]
pub struct RequestError {
    #[source]
    pub cause: TestError,
}

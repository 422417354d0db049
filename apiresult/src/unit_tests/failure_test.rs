use crate::unit_tests::{RequestError, TestError};
use crate::{ApiError, ApiResult, Failure};
use std::error::Error as StdError;

#[test]
fn test_downcast() {
    let failure = Failure::new(TestError::Network);
    assert!(failure.is::<TestError>());
    assert!(!failure.is::<ApiError>());
    assert_eq!(failure.downcast_ref::<TestError>(), Some(&TestError::Network));
    assert!(failure.api_error().is_none());
    assert_eq!(failure.to_string(), "network unreachable");
}

#[test]
fn test_question_mark_converts() {
    fn parse(input: &str) -> Result<u8, Failure> {
        Ok(input.parse::<u8>()?)
    }

    let failure = parse("300").unwrap_err();
    assert!(failure.is::<std::num::ParseIntError>());
    assert_eq!(parse("42").unwrap(), 42);
}

#[test]
fn test_clone_keeps_identity() {
    let failure = Failure::new(TestError::Validation("name".to_string()));
    let copy = failure.clone();
    assert!(Failure::ptr_eq(&failure, &copy));

    let rebuilt = Failure::new(TestError::Validation("name".to_string()));
    assert!(!Failure::ptr_eq(&failure, &rebuilt));
    assert_eq!(failure, rebuilt);
    assert_ne!(failure, Failure::new(TestError::Network));
}

#[test]
fn test_message_equality() {
    assert_eq!(Failure::msg("boom"), Failure::msg("boom"));
    assert_ne!(Failure::msg("boom"), Failure::msg("bang"));
    assert_ne!(Failure::msg("boom"), Failure::condition_not_satisfied_with("boom"));
}

#[test]
fn test_sentinels() {
    let not_finished = Failure::not_finished();
    assert!(not_finished.is_not_finished());
    assert!(!not_finished.is_condition_not_satisfied());
    assert_eq!(not_finished.api_error(), Some(&ApiError::NotFinished));

    let condition = Failure::condition_not_satisfied();
    assert!(condition.is_condition_not_satisfied());
    assert!(!condition.is_not_finished());
    assert_eq!(condition.to_string(), "Condition was not satisfied");

    assert!(!Failure::msg("plain").is_not_finished());
}

#[test]
fn test_source_chain() {
    let failure = Failure::new(RequestError {
        cause: TestError::Network,
    });

    let cause = failure.source().unwrap();
    assert_eq!(cause.to_string(), "network unreachable");

    let messages: Vec<String> = failure.chain().map(ToString::to_string).collect();
    assert_eq!(messages, vec!["request failed", "network unreachable"]);
}

#[test]
fn test_chain_survives_result_round_trip() {
    let failure = Failure::new(RequestError {
        cause: TestError::Network,
    });
    let result: ApiResult<i32> = ApiResult::error(failure.clone());

    let returned = result.map(|value| value + 1).into_result().unwrap_err();
    assert!(Failure::ptr_eq(&failure, &returned));
    assert!(returned.source().is_some());
}

#[test]
fn test_into_boxed_error() {
    let failure = Failure::new(RequestError {
        cause: TestError::Network,
    });
    let boxed: Box<dyn StdError + Send + Sync> = failure.into();
    assert_eq!(boxed.to_string(), "request failed");
    assert_eq!(boxed.source().unwrap().to_string(), "network unreachable");
}

#[test]
fn test_from_boxed() {
    let boxed: Box<dyn StdError + Send + Sync> = Box::new(TestError::Network);
    let failure = Failure::from_boxed(boxed);
    assert!(failure.is::<TestError>());
}

#[test]
fn test_debug() {
    assert_eq!(format!("{:?}", Failure::msg("boom")), r#"Failure(Message("boom"))"#);
}

mod lookalike {
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("timeout")]
    pub struct Timeout;
}

#[derive(thiserror::Error, Debug)]
#[error("timeout")]
struct Timeout;

#[test]
fn test_equal_debug_of_different_types_is_not_equal() {
    let ours = Failure::new(Timeout);
    let theirs = Failure::new(lookalike::Timeout);
    assert_eq!(format!("{:?}", ours), format!("{:?}", theirs));
    assert_ne!(ours, theirs);
    assert_eq!(ours, Failure::new(Timeout));
}

#[test]
fn test_boxed_failures_compare_by_identity() {
    let boxed = Failure::from_boxed(Box::new(TestError::Network));
    assert_eq!(boxed, boxed.clone());
    assert_ne!(boxed, Failure::from_boxed(Box::new(TestError::Network)));
    assert_ne!(boxed, Failure::new(TestError::Network));
}

#[test]
fn test_chain_of_a_plain_error() {
    let failure = Failure::msg("alone");
    let messages: Vec<String> = failure.chain().map(ToString::to_string).collect();
    assert_eq!(messages, vec!["alone"]);
}

mod api_error;
mod api_result;
mod emptiness;
mod failure;
mod into_api_result;
mod iter_ext;
mod retry_trigger;
mod scope;
#[cfg(feature = "serde")]
mod serde_support;
mod single_flight;
mod stream_ext;

#[cfg(test)]
mod unit_tests;

pub use api_error::*;
pub use api_result::*;
pub use emptiness::*;
pub use failure::*;
pub use into_api_result::*;
pub use iter_ext::*;
pub use retry_trigger::*;
pub use scope::*;
pub use single_flight::*;
pub use stream_ext::*;

pub mod cdwch;
pub mod client;
pub mod common;
pub mod cynosdb;
pub mod dts;
pub mod error;
pub mod monitor;
pub mod retry;
pub mod scf;
pub mod sign;
pub mod sqlserver;
pub mod vpc;
pub mod waf;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, ClientConfig};
pub use error::ApiError;
pub use retry::{poll_flow, retry, retry_error, wait_for_state, RetryError, RetryPolicy};
pub use sign::Credential;

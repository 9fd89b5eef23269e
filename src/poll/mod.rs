//! Polling of asynchronous platform operations.
//!
//! The platform answers long-running requests with a location URI. A
//! [`PollHandler`] describes how to read that URI and a [`DeferredResult`]
//! drives the polling loop and caches the outcome.

mod handler;
mod result;
mod settings;

pub use handler::{default_classify, PollHandler, PollResponse, PollStatus, SimplePollHandler};
pub use result::DeferredResult;
pub use settings::PollSettings;

//! GoodData API model types.

mod common;
mod project;
mod report;
mod schedule;

pub use common::*;
pub use project::*;
pub use report::*;
pub use schedule::*;

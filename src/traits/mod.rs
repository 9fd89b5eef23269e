//! Trait definitions for GoodData operations.
//!
//! Each entity type implements the traits it supports, encapsulating
//! API differences in the implementations.

mod get;

pub use get::Get;

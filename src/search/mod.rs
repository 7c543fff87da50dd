//! Search orchestration module
//!
//! Starts one task per provider and streams their outcomes back
//! in completion order.

mod executor;
mod models;

pub use executor::{Aggregator, SearchRun, UNSUPPORTED};
pub use models::*;

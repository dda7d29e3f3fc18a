//! Domain model for drawlang experiments.
//!
//! These types mirror the JSON documents exchanged between the experiment page,
//! the server and the response store. A session document is an
//! [`ExperimentConfig`] whose phases accumulate participant responses as the
//! session progresses.

pub mod domain;
mod error;

pub use domain::*;
pub use error::{CoreError, Result};

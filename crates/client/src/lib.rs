//! HTTP client for the drawlang experiment server.
//!
//! Implements the engine's [`ExperimentSource`](engine::ExperimentSource) and
//! [`SessionSink`](engine::SessionSink) ports over `GET /experiment_config`,
//! `GET /user_results` and `POST /record_data`.

mod client;
mod error;

pub use client::{ExperimentClient, Participant};
pub use error::{ClientError, Result};

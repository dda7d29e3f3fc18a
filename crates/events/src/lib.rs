//! Session event stream for drawlang
//!
//! Controllers publish every navigation outcome and persistence result here so
//! that frontends, loggers and tests can follow a session without reaching into
//! its state.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;

mod experiment;
mod phase;
mod record;

pub use experiment::*;
pub use phase::*;
pub use record::*;

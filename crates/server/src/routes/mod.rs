mod experiment;
mod health;
mod records;

pub use experiment::*;
pub use health::*;
pub use records::*;

//! Outbound side: where finished pages go, and where progress text goes.

pub mod paced;
pub mod port;
pub mod progress;
pub mod types;

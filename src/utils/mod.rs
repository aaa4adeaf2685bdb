pub mod helper;

mod aggregates;
pub use aggregates::{Aggregates, Statistics};

mod listeners;
pub use listeners::{ListenerId, Listeners};

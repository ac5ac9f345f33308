pub mod viewer;

pub use viewer::{LoadSummary, Subscriber, TransportCommand, ViewerSession};

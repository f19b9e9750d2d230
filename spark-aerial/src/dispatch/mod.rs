pub mod dispatcher;
pub mod partition;
pub mod worker;

pub use dispatcher::{Dispatcher, RunSummary};

pub mod config;
pub mod diff;
pub mod errors;
pub mod filters;
pub mod git;
pub mod index;
pub mod metrics;
pub mod pool;
pub mod results;
pub mod runner;
pub mod search;
pub mod symbols;
pub mod timefmt;
pub mod walker;
pub mod watch;

pub use config::ScoutConfig;
pub use errors::{ScoutError, ScoutResult};
pub use filters::ExtensionFilter;
pub use pool::WorkerPool;
pub use results::{SearchMatch, SearchOutput};
pub use walker::PathWalker;

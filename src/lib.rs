// Crate root: declare modules and control visibility
pub mod command;
pub mod config;
pub mod discovery;
pub mod exec;
pub mod host;
pub mod logging;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod staging;
pub mod symbols;
pub mod terminal;
pub mod utils;

// Re-export commonly used API from the library for binaries/tests
pub use config::Config;
pub use host::Host;
pub use report::Report;
pub use runner::{RunMode, RunOutcome, Runner};
pub use utils::normalize_input_path;

pub mod config;
pub mod context;
pub mod detect;
pub mod fsops;
pub mod import;
pub mod logging;
pub mod prompt;
pub mod summary;
pub mod sync;
pub mod update;

pub use config::AppConfig;
pub use context::{RunContext, RunFlags};
pub use summary::{Outcome, Summary};

pub mod app;
pub mod config;
pub mod executor;
pub mod host;
pub mod model;
pub mod traits;
pub mod transfer;

// Re-export common types for convenience
pub use app::App;
pub use config::Config;
pub use executor::*;
pub use host::{HostUi, MessageLevel, TerminalHost};
pub use model::*;
pub use traits::*;

// Module exports
pub mod common;
pub mod config;
pub mod entities;
pub mod events;

// Re-export commonly used types
pub use common::*;
pub use config::*;
pub use entities::*;
pub use events::*;

//! Core data types for the cross-rate watcher.

pub mod asset;
pub mod error;
pub mod price;
pub mod retry;
pub mod threshold;

pub use asset::*;
pub use error::*;
pub use price::*;
pub use retry::*;
pub use threshold::*;

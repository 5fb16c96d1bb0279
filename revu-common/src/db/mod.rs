//! Database models and queries

pub mod businesses;
pub mod init;
pub mod models;
pub mod reviews;
pub mod usage;

pub use businesses::*;
pub use init::*;
pub use models::*;
pub use reviews::*;
pub use usage::*;

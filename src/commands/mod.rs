//! CLI commands implementation

pub mod analyze;
pub mod init;

pub use analyze::*;
pub use init::*;

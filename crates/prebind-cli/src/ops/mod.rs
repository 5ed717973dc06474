//! Operations behind the commands, free of argument parsing and printing.

pub mod context;
pub mod error;
pub mod install;

pub use context::Context;
pub use error::InstallError;

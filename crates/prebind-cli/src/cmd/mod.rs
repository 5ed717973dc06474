//! Command entry points. Each turns parsed arguments into an operation and
//! attaches context to its errors.

pub mod completions;
pub mod env;
pub mod install;
pub mod locate;

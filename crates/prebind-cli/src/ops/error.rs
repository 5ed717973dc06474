//! Domain-specific errors for project operations

use prebind_core::{ConfigError, ProjectError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read project: {0}")]
    Project(#[from] ProjectError),
}

/// Render an error with its whole source chain, outermost first.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

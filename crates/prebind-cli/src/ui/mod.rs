//! Terminal output.
//!
//! - [`theme`] - Colors and icons
//! - [`reporter`] - [`ConsoleReporter`], the crossterm-styled reporting sink

pub mod reporter;
pub mod theme;

pub use reporter::ConsoleReporter;
pub use theme::Theme;

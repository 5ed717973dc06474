//! Console implementation of the core reporting sink.

use crossterm::style::Stylize;
use prebind_core::Reporter;

use super::Theme;

/// Prints reports to the terminal.
///
/// Informational output goes to stdout; warnings and errors go to stderr so
/// they survive redirection of the normal output.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    theme: Theme,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Summary line, e.g. `3 packages mutated in 0.2s`.
pub fn summary_line(count: usize, action: &str, elapsed_secs: f64) -> String {
    format!(
        "{count} package{} {action} in {elapsed_secs:.1}s",
        if count == 1 { "" } else { "s" }
    )
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        let c = &self.theme.colors;
        println!();
        println!("{} {}", self.theme.icons.section.with(c.header), title.with(c.header).bold());
    }

    fn info(&self, msg: &str) {
        let c = &self.theme.colors;
        println!("  {} {}", self.theme.icons.info.with(c.secondary), msg.with(c.info));
    }

    fn success(&self, msg: &str) {
        let c = &self.theme.colors;
        println!("{} {}", self.theme.icons.success.with(c.success), msg.with(c.success));
    }

    fn warning(&self, msg: &str) {
        let c = &self.theme.colors;
        eprintln!("{} {}", self.theme.icons.warning.with(c.warning), msg.with(c.warning));
    }

    fn error(&self, msg: &str) {
        let c = &self.theme.colors;
        eprintln!("{} {}", self.theme.icons.error.with(c.error), msg.with(c.error));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        self.success(&summary_line(count, action, elapsed_secs));
    }
}

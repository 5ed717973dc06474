//! UI Theme - colors and icons used by the console reporter

use crossterm::style::Color;

/// Visual elements of prebind's output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different message kinds
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
}

/// Color scheme for messages
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Section headers
    pub header: Color,
    /// Informational lines
    pub info: Color,
    /// Success states
    pub success: Color,
    /// Warning states
    pub warning: Color,
    /// Error states
    pub error: Color,
    /// Timings and other secondary detail
    pub secondary: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Cyan,
            info: Color::Reset,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            secondary: Color::DarkGrey,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Section marker (➤)
    pub section: &'static str,
    /// Info state (ℹ)
    pub info: &'static str,
    /// Success state (✓)
    pub success: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Error state (✗)
    pub error: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            section: "➤",
            info: "ℹ",
            success: "✓",
            warning: "⚠",
            error: "✗",
        }
    }
}

//! Theme and color definitions for the TUI.

use crate::services::HealthLevel;
use ratatui::style::{Color, Modifier, Style};

/// Theme for the TUI with consistent color scheme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Magenta,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            info: Color::Blue,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Get style for titles.
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for headers.
    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for success messages.
    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// Get style for warnings.
    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    /// Get style for errors.
    pub fn error(&self) -> Style {
        Style::default().fg(self.danger)
    }

    /// Get style for info messages.
    pub fn info(&self) -> Style {
        Style::default().fg(self.info)
    }

    /// Get style for muted text.
    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Get style for borders.
    pub fn border(&self) -> Style {
        Style::default().fg(self.primary)
    }

    /// Flashing banner for an active margin call.
    pub fn alert(&self) -> Style {
        Style::default()
            .fg(Color::White)
            .bg(self.danger)
            .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK)
    }

    /// Get style for tabs (active).
    pub fn tab_active(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for tabs (inactive).
    pub fn tab_inactive(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Green for gains, red for losses.
    pub fn signed(&self, value: f64) -> Style {
        if value >= 0.0 {
            self.success()
        } else {
            self.error()
        }
    }

    /// Get style for a margin health level.
    pub fn health(&self, level: HealthLevel) -> Style {
        match level {
            HealthLevel::Healthy => self.success(),
            HealthLevel::Caution => self.warning(),
            HealthLevel::AtRisk | HealthLevel::MarginCall => self.error(),
        }
    }
}

//! Color themes for the dashboard.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Color theme applied to every effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    /// Violet rain on black.
    #[default]
    Amethyst,
    /// Classic green phosphor.
    Phosphor,
    Ice,
    Amber,
}

impl Theme {
    /// All themes in cycling order.
    pub const ALL: [Theme; 4] = [Theme::Amethyst, Theme::Phosphor, Theme::Ice, Theme::Amber];

    /// Primary color: rain trails and settled text.
    pub fn accent(self) -> Color {
        match self {
            Theme::Amethyst => Color::Rgb(0xA6, 0x78, 0xED),
            Theme::Phosphor => Color::Rgb(0x3C, 0xFF, 0x6A),
            Theme::Ice => Color::Rgb(0x7F, 0xD8, 0xFF),
            Theme::Amber => Color::Rgb(0xFF, 0xB0, 0x3B),
        }
    }

    /// Secondary color: scrambling glyphs, labels and help text.
    pub fn muted(self) -> Color {
        match self {
            Theme::Amethyst => Color::Rgb(0x6B, 0x4F, 0x99),
            Theme::Phosphor => Color::Rgb(0x22, 0x8B, 0x3C),
            Theme::Ice => Color::Rgb(0x4A, 0x7F, 0x99),
            Theme::Amber => Color::Rgb(0x99, 0x6A, 0x24),
        }
    }

    /// The next theme in cycling order.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Amethyst => "amethyst",
            Theme::Phosphor => "phosphor",
            Theme::Ice => "ice",
            Theme::Amber => "amber",
        }
    }
}

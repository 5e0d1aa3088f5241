//! UI Theme Module - Consistent color palette and style helpers
//!
//! Provides the two command center looks, selected by the persisted map
//! theme preference:
//! - Palette tokens (not hard-coded colors)
//! - StyleKit helpers for common states
//! - `division` (amber on charcoal) and `animus` (white on black, cyan accent)

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use ratatui::style::{Color, Modifier, Style};

use opsdeck_core::model::MapTheme;

/// Color palette tokens for the theme
#[derive(Clone, Debug)]
pub struct Palette {
    /// Panel/pane background
    pub panel_bg: Color,
    /// Panel border color
    pub panel_border: Color,
    /// Primary text color
    pub text: Color,
    /// Dimmed text (secondary info)
    pub text_dim: Color,
    /// Muted text (tertiary info, disabled)
    pub text_muted: Color,
    /// Accent color (highlights, focus)
    pub accent: Color,
    /// Layer or tool switched on
    pub active: Color,
    /// Warnings and pending deliveries
    pub warn: Color,
    /// Selection background
    pub selection_bg: Color,
    /// Selection foreground
    pub selection_fg: Color,
    /// Key hint text
    pub key_hint: Color,
    /// Map grid lines
    pub grid: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::division()
    }
}

impl Palette {
    /// Amber tactical theme
    pub fn division() -> Self {
        Self {
            panel_bg: Color::Rgb(24, 24, 26),
            panel_border: Color::Rgb(70, 64, 56),
            text: Color::Rgb(226, 220, 210),
            text_dim: Color::Rgb(160, 152, 140),
            text_muted: Color::Rgb(100, 96, 90),
            accent: Color::Rgb(255, 140, 0),
            active: Color::Rgb(255, 176, 64),
            warn: Color::Rgb(230, 190, 90),
            selection_bg: Color::Rgb(110, 60, 10),
            selection_fg: Color::White,
            key_hint: Color::Rgb(255, 170, 80),
            grid: Color::Rgb(48, 44, 40),
        }
    }

    /// High contrast theme with a cyan accent
    pub fn animus() -> Self {
        Self {
            panel_bg: Color::Black,
            panel_border: Color::White,
            text: Color::White,
            text_dim: Color::Rgb(200, 200, 200),
            text_muted: Color::Rgb(150, 150, 150),
            accent: Color::Cyan,
            active: Color::LightCyan,
            warn: Color::Yellow,
            selection_bg: Color::Blue,
            selection_fg: Color::White,
            key_hint: Color::Yellow,
            grid: Color::DarkGray,
        }
    }
}

/// Theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    // ========== StyleKit Helper Functions ==========

    /// Style for an on/off layer or tool label
    pub fn toggle_style(&self, on: bool) -> Style {
        if on {
            Style::default()
                .fg(self.palette.active)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.palette.text_muted)
        }
    }

    /// Style for key hints in footer
    pub fn key_hint_style(&self) -> Style {
        Style::default().fg(self.palette.key_hint)
    }

    /// Style for subtle borders
    pub fn subtle_border_style(&self) -> Style {
        Style::default().fg(self.palette.panel_border)
    }

    /// Style for focused borders
    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.palette.accent)
    }

    /// Style for selected items
    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.palette.selection_bg)
            .fg(self.palette.selection_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.palette.text)
    }

    pub fn text_dim_style(&self) -> Style {
        Style::default().fg(self.palette.text_dim)
    }

    pub fn text_muted_style(&self) -> Style {
        Style::default().fg(self.palette.text_muted)
    }

    pub fn accent_bold_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warn_style(&self) -> Style {
        Style::default().fg(self.palette.warn)
    }

    pub fn grid_style(&self) -> Style {
        Style::default().fg(self.palette.grid)
    }

    /// Style for panel bodies drawn over the map
    pub fn panel_style(&self) -> Style {
        Style::default()
            .bg(self.palette.panel_bg)
            .fg(self.palette.text)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.palette.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn section_header_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }
}

static DIVISION: OnceLock<Theme> = OnceLock::new();
static ANIMUS: OnceLock<Theme> = OnceLock::new();
static ANIMUS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Switch the theme used by [`styles`].
pub fn set_active(map_theme: MapTheme) {
    ANIMUS_ACTIVE.store(map_theme == MapTheme::Animus, Ordering::Relaxed);
}

/// Get the active theme
pub fn theme() -> &'static Theme {
    if ANIMUS_ACTIVE.load(Ordering::Relaxed) {
        ANIMUS.get_or_init(|| Theme::new(Palette::animus()))
    } else {
        DIVISION.get_or_init(|| Theme::new(Palette::division()))
    }
}

/// Convenience re-exports for common use cases
pub mod styles {
    use super::*;

    pub fn toggle(on: bool) -> Style {
        theme().toggle_style(on)
    }

    pub fn key_hint() -> Style {
        theme().key_hint_style()
    }

    pub fn border_subtle() -> Style {
        theme().subtle_border_style()
    }

    pub fn border_focused() -> Style {
        theme().focused_border_style()
    }

    pub fn selection() -> Style {
        theme().selection_style()
    }

    pub fn text() -> Style {
        theme().text_style()
    }

    pub fn text_dim() -> Style {
        theme().text_dim_style()
    }

    pub fn text_muted() -> Style {
        theme().text_muted_style()
    }

    pub fn accent_bold() -> Style {
        theme().accent_bold_style()
    }

    pub fn warn() -> Style {
        theme().warn_style()
    }

    pub fn grid() -> Style {
        theme().grid_style()
    }

    pub fn panel() -> Style {
        theme().panel_style()
    }

    pub fn title() -> Style {
        theme().title_style()
    }

    pub fn section_header() -> Style {
        theme().section_header_style()
    }
}

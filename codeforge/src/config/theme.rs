use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use terminal_colorsaurus::QueryOptions;

/// General theme
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Theme {
    pub text: TextTheme,
    pub editor: EditorTheme,
    /// Terminal foreground. Queried from the terminal when not configured.
    pub term_fg: Option<Color>,
    /// Terminal background. Queried from the terminal when not configured.
    pub term_bg: Option<Color>,
}

impl Theme {
    /// Fill in the terminal colors that were not configured
    ///
    /// Asks the terminal for its palette, falling back to white on black.
    pub fn resolve_terminal_colors(&mut self) {
        if self.term_fg.is_some() && self.term_bg.is_some() {
            return;
        }

        let palette = terminal_colorsaurus::color_palette(QueryOptions::default()).ok();

        let (fg, bg) = if let Some(palette) = palette {
            let fg = palette.foreground.scale_to_8bit();
            let bg = palette.background.scale_to_8bit();
            (Color::Rgb(fg.0, fg.1, fg.2), Color::Rgb(bg.0, bg.1, bg.2))
        } else {
            tracing::debug!("terminal palette unavailable, using defaults");
            (Color::Rgb(255, 255, 255), Color::Rgb(0, 0, 0))
        };

        self.term_fg.get_or_insert(fg);
        self.term_bg.get_or_insert(bg);
    }

    pub fn fg(&self) -> Color {
        self.term_fg.unwrap_or(Color::White)
    }

    pub fn bg(&self) -> Color {
        self.term_bg.unwrap_or(Color::Black)
    }
}

/// Text color theme
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TextTheme {
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight: Color,
}

impl Default for TextTheme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            highlight: Color::Blue,
        }
    }
}

/// Colors of the lesson panes
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorTheme {
    /// Instructor annotations shown after editor lines
    pub annotation: Color,
    /// Line numbers in the gutter
    pub gutter: Color,
    /// Filled part of the progress bar
    pub progress: Color,
}

impl Default for EditorTheme {
    fn default() -> Self {
        Self {
            annotation: Color::Rgb(52, 168, 83),
            gutter: Color::DarkGray,
            progress: Color::Cyan,
        }
    }
}

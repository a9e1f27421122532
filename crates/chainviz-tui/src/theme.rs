use clap::ValueEnum;
use ratatui::style::Color;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Colours the renderer draws with. Derived from the theme, never stored.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub secondary: Color,
    pub accent: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub background: Color,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                text: Color::White,
                secondary: Color::Gray,
                accent: Color::Magenta,
                success: Color::Green,
                error: Color::Red,
                warning: Color::Yellow,
                background: Color::Black,
            },
            Theme::Light => Palette {
                text: Color::Black,
                secondary: Color::DarkGray,
                accent: Color::Blue,
                success: Color::Rgb(0, 128, 0),
                error: Color::Rgb(190, 0, 0),
                warning: Color::Rgb(160, 110, 0),
                background: Color::White,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_round_trips() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }

    #[test]
    fn palettes_differ() {
        assert_ne!(Theme::Dark.palette().text, Theme::Light.palette().text);
    }
}

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub border: Color,
    pub border_focused: Color,
    pub positive: Color,
    pub negative: Color,
    pub error: Color,
}

impl Theme {
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode { Self::dark() } else { Self::light() }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(8, 12, 16),
            surface: Color::Rgb(20, 26, 32),
            text: Color::Rgb(220, 220, 220),
            text_muted: Color::Rgb(140, 140, 140),
            accent: Color::Rgb(80, 160, 160),
            border: Color::Rgb(60, 68, 76),
            border_focused: Color::Rgb(80, 160, 160),
            positive: Color::Rgb(90, 180, 110),
            negative: Color::Rgb(210, 110, 90),
            error: Color::Rgb(200, 80, 80),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(246, 246, 242),
            surface: Color::Rgb(255, 255, 255),
            text: Color::Rgb(30, 34, 38),
            text_muted: Color::Rgb(110, 114, 118),
            accent: Color::Rgb(20, 110, 120),
            border: Color::Rgb(200, 204, 208),
            border_focused: Color::Rgb(20, 110, 120),
            positive: Color::Rgb(30, 130, 60),
            negative: Color::Rgb(170, 60, 40),
            error: Color::Rgb(180, 40, 40),
        }
    }
}

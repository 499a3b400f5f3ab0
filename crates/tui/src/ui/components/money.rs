use engine::MoneyCents;
use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// Amount colored by sign, for profits.
#[must_use]
pub fn styled_profit(amount: MoneyCents, theme: &Theme) -> Span<'static> {
    let color = if amount.is_positive() {
        theme.positive
    } else if amount.is_negative() {
        theme.negative
    } else {
        theme.text
    };
    Span::styled(amount.to_string(), Style::default().fg(color))
}

/// Amount in the neutral text color.
#[must_use]
pub fn plain(amount: MoneyCents, theme: &Theme) -> Span<'static> {
    Span::styled(amount.to_string(), Style::default().fg(theme.text))
}

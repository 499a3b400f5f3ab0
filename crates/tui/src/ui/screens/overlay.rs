use engine::{Gateway, Inventory, MoneyCents};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
};

use crate::{
    app::{AppState, FormKind, FormState, Overlay},
    ui::{
        components::{card::Card, money},
        screens::login::centered_box,
        theme::Theme,
    },
};

pub fn render<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    match &state.overlay {
        Some(Overlay::Form(form)) => render_form(frame, area, form, inventory, theme),
        Some(Overlay::ConfirmDelete { label, .. }) => render_confirm(frame, area, label, theme),
        None => {}
    }
}

fn render_form<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    form: &FormState,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    let mut lines = Vec::new();
    for (index, row) in form.fields.iter().enumerate() {
        let focused = index == form.focus;
        let cursor = if focused { "│" } else { "" };
        let value_style = if focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<18}", row.label),
                Style::default().fg(theme.text_muted),
            ),
            Span::styled(format!("{}{cursor}", row.value), value_style),
        ]));
        if let Some(error) = form.error_for(index) {
            lines.push(Line::from(Span::styled(
                format!("{:<18}{error}", ""),
                Style::default().fg(theme.error),
            )));
        }
    }

    if let FormKind::Sell(id) = &form.kind
        && let Ok(vehicle) = inventory.vehicle(id)
    {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<18}", "Total cost"),
                Style::default().fg(theme.text_muted),
            ),
            money::plain(vehicle.total_cost(), theme),
        ]));
        if let Ok(price) = form.value(0).parse::<MoneyCents>()
            && price.is_positive()
        {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<18}", "Profit"),
                    Style::default().fg(theme.text_muted),
                ),
                money::styled_profit(vehicle.projected_profit(price), theme),
            ]));
        }
    }

    if let Some(message) = &form.message {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(theme.error),
        )));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Tab next  Enter save  Esc cancel",
        Style::default().fg(theme.text_muted),
    )));

    let height = (lines.len() as u16 + 2).min(area.height);
    let rect = centered_box(64.min(area.width), height, area);
    let block = Card::new(&form.title, theme).focused(true).block();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        rect,
    );
}

fn render_confirm(frame: &mut Frame<'_>, area: Rect, label: &str, theme: &Theme) {
    let lines = vec![
        Line::from(format!("Delete {label}?")),
        Line::from(Span::styled(
            "y confirm, any other key cancels",
            Style::default().fg(theme.text_muted),
        )),
    ];
    let rect = centered_box(48.min(area.width), 4.min(area.height), area);
    let block = Card::new("confirm", theme).focused(true).block();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        rect,
    );
}

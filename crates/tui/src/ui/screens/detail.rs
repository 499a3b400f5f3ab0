use engine::{Gateway, Inventory, Vehicle};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
    app::AppState,
    ui::{
        components::{card::Card, money},
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
    let Some(vehicle) = state
        .detail
        .as_ref()
        .and_then(|id| inventory.vehicle(id).ok())
    else {
        let block = Card::new("vehicle", theme).block();
        frame.render_widget(
            Paragraph::new("This car is no longer in the inventory.").block(block),
            area,
        );
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[0]);

    render_info(frame, top[0], vehicle, theme);
    render_money(frame, top[1], vehicle, theme);
    render_expenses(frame, layout[1], state, vehicle, theme);
}

fn field<'a>(label: &'static str, value: impl Into<Span<'a>>, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<16}"), Style::default().fg(theme.text_muted)),
        value.into(),
    ])
}

fn render_info(frame: &mut Frame<'_>, area: Rect, vehicle: &Vehicle, theme: &Theme) {
    let title = vehicle.title();
    let mut lines = vec![
        field("Miles", vehicle.miles.to_string(), theme),
        field("Color", vehicle.color.clone().unwrap_or_else(|| "-".to_string()), theme),
        field(
            "Added",
            vehicle.created_at.format("%Y-%m-%d").to_string(),
            theme,
        ),
        field(
            "Photo",
            if vehicle.image_url.is_some() { "attached" } else { "-" },
            theme,
        ),
        field(
            "Invoice",
            if vehicle.invoice_url.is_some() { "attached" } else { "-" },
            theme,
        ),
    ];
    if let Some(notes) = &vehicle.notes {
        lines.push(field("Notes", notes.clone(), theme));
    }

    let block = Card::new(&title, theme).focused(true).block();
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_money(frame: &mut Frame<'_>, area: Rect, vehicle: &Vehicle, theme: &Theme) {
    let mut lines = vec![
        field("Purchase price", money::plain(vehicle.purchase_price, theme), theme),
        field("Expenses", money::plain(vehicle.total_expenses(), theme), theme),
        field("Total cost", money::plain(vehicle.total_cost(), theme), theme),
    ];
    match (vehicle.sale_price(), vehicle.sale_date(), vehicle.profit()) {
        (Some(price), Some(date), Some(profit)) => {
            lines.push(field("Sold for", money::plain(price, theme), theme));
            lines.push(field("Sold on", date.format("%Y-%m-%d").to_string(), theme));
            lines.push(field("Profit", money::styled_profit(profit, theme), theme));
        }
        _ => {
            lines.push(field("Book value", money::plain(vehicle.book_value, theme), theme));
            lines.push(field(
                "Status",
                Span::styled("In stock", Style::default().fg(theme.accent)),
                theme,
            ));
        }
    }

    let block = Card::new("money", theme).block();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_expenses(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    vehicle: &Vehicle,
    theme: &Theme,
) {
    let expenses = vehicle.expenses_newest_first();
    let block = Card::new("expenses", theme).block();
    if expenses.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No expenses recorded. Press a to add one.",
                Style::default().fg(theme.text_muted),
            ))
            .block(block),
            area,
        );
        return;
    }

    let items = expenses
        .iter()
        .map(|expense| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    expense.date.format("%Y-%m-%d  ").to_string(),
                    Style::default().fg(theme.text_muted),
                ),
                Span::raw(format!("{:>12}  ", expense.amount.to_string())),
                Span::raw(expense.description.clone()),
            ]))
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(state.expense_selected.min(expenses.len() - 1)));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

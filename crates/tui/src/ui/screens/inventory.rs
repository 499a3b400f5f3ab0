use engine::{Gateway, Inventory, Vehicle};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::AppState,
    ui::{
        components::{
            card::{Card, StatCard},
            money,
        },
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
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Stat cards
            Constraint::Length(3), // Search
            Constraint::Min(0),    // List
        ])
        .split(area);

    render_stats(frame, layout[0], inventory, theme);
    render_search(frame, layout[1], state, inventory, theme);
    render_list(frame, layout[2], state, inventory, theme);
}

fn render_stats<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    let stats = inventory.stats();
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    StatCard::new("Total cars", stats.total_cars.to_string(), theme)
        .subtitle(format!(
            "{} sold, {} in stock",
            stats.sold_cars, stats.inventory_cars
        ))
        .render(frame, cards[0]);
    StatCard::new(
        "Total profit",
        money::styled_profit(stats.total_profit, theme),
        theme,
    )
    .subtitle(format!("revenue {}", stats.total_revenue))
    .render(frame, cards[1]);
    StatCard::new(
        "Average profit",
        money::styled_profit(stats.average_profit, theme),
        theme,
    )
    .render(frame, cards[2]);
    StatCard::new(
        "Inventory value",
        money::plain(stats.total_book_value, theme),
        theme,
    )
    .subtitle(format!("invested {}", stats.total_investment))
    .render(frame, cards[3]);
}

fn render_search<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    let query = inventory.query();
    let line = if query.is_empty() && !state.searching {
        Line::from(Span::styled(
            "Search by make, model or year (/)",
            Style::default().fg(theme.text_muted),
        ))
    } else {
        let cursor = if state.searching { "│" } else { "" };
        Line::from(Span::styled(
            format!("{query}{cursor}"),
            Style::default().fg(theme.text),
        ))
    };

    let block = Card::new("search", theme).focused(state.searching).block();
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_list<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    let visible = inventory.visible();
    let block = Card::new("inventory", theme)
        .focused(!state.searching)
        .block();

    if visible.is_empty() {
        let message = if inventory.query().trim().is_empty() {
            "No cars yet. Press n to add one."
        } else {
            "No cars match the search."
        };
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(theme.text_muted)))
                .block(block),
            area,
        );
        return;
    }

    let items = visible
        .iter()
        .map(|vehicle| ListItem::new(list_line(vehicle, theme)))
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected.min(visible.len() - 1)));

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

fn list_line(vehicle: &Vehicle, theme: &Theme) -> Line<'static> {
    let mut spans = vec![
        Span::raw(format!("{:<30}", vehicle.title())),
        Span::styled(
            format!("{:>9} mi  ", vehicle.miles),
            Style::default().fg(theme.text_muted),
        ),
        Span::raw(format!("{:>14}  ", vehicle.purchase_price.to_string())),
    ];
    match (vehicle.sale_price(), vehicle.profit()) {
        (Some(price), Some(profit)) => {
            spans.push(Span::styled(
                format!("SOLD {price}  "),
                Style::default().fg(theme.text_muted),
            ));
            spans.push(money::styled_profit(profit, theme));
        }
        _ => spans.push(Span::styled("In stock", Style::default().fg(theme.accent))),
    }
    Line::from(spans)
}

pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use engine::{Gateway, Inventory};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::app::{AppState, Screen};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render<G: Gateway>(frame: &mut Frame<'_>, state: &AppState, inventory: &Inventory<G>) {
    let theme = Theme::for_mode(state.dark_mode);
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background).fg(theme.text)),
        area,
    );

    match state.screen {
        Screen::Login => screens::login::render(frame, area, state, &theme),
        Screen::Inventory | Screen::Detail => render_shell(frame, area, state, inventory, &theme),
    }

    screens::overlay::render(frame, area, state, inventory, &theme);
    components::toast::render(frame, area, state.toast.as_ref(), &theme);
}

fn render_shell<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, inventory, theme);
    match state.screen {
        Screen::Detail => screens::detail::render(frame, layout[1], state, inventory, theme),
        _ => screens::inventory::render(frame, layout[1], state, inventory, theme),
    }
    render_bottom_bar(frame, layout[2], state, theme);
}

fn render_info_bar<G: Gateway>(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    inventory: &Inventory<G>,
    theme: &Theme,
) {
    let user = state.user.as_deref().unwrap_or("-");
    let mode = if state.dark_mode { "dark" } else { "light" };
    let line = Line::from(vec![
        Span::styled("lotbook", Style::default().fg(theme.accent)),
        Span::raw("  "),
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {user}  ")),
        Span::styled("Cars", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", inventory.vehicles().len())),
        Span::styled("Theme", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {mode}")),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let hints: &[(&str, &str)] = match (state.screen, state.searching) {
        (Screen::Inventory, true) => &[("type", "filter"), ("Enter", "done"), ("Esc", "clear")],
        (Screen::Inventory, false) => &[
            ("/", "search"),
            ("Enter", "detail"),
            ("n", "new"),
            ("s", "sell"),
            ("x", "delete"),
            ("e", "export"),
            ("r", "refresh"),
            ("d", "dark mode"),
            ("L", "sign out"),
            ("q", "quit"),
        ],
        _ => &[
            ("b", "back"),
            ("s", "sell"),
            ("e", "edit"),
            ("a", "add expense"),
            ("E", "edit expense"),
            ("x", "delete expense"),
            ("X", "delete car"),
            ("p/i", "attach photo/invoice"),
            ("o/O", "open invoice/photo"),
        ],
    };

    let mut parts = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            parts.push(Span::raw("  "));
        }
        parts.push(Span::styled(*key, Style::default().fg(theme.accent)));
        parts.push(Span::raw(format!(" {action}")));
    }

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

#[cfg(test)]
mod tests {
    use engine::{MemoryGateway, SettingsStore};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    use super::*;
    use crate::app::App;

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn draw(app: &App<MemoryGateway>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|frame| render(frame, &app.state, app.inventory()))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    async fn demo_app() -> App<MemoryGateway> {
        let path = std::env::temp_dir()
            .join(format!("lotbook_tui_{}", uuid::Uuid::new_v4()))
            .join("settings.json");
        let gateway = MemoryGateway::demo().await.unwrap();
        let mut app = App::new(
            Inventory::new(gateway),
            SettingsStore::load(path).unwrap(),
            "",
        );
        app.start().await;
        app
    }

    #[tokio::test]
    async fn inventory_screen_shows_cards_and_cars() {
        let app = demo_app().await;
        let screen = draw(&app);
        assert!(screen.contains("Total profit"), "{screen}");
        assert!(screen.contains("$1,630.00"), "{screen}");
        assert!(screen.contains("2019 Toyota Corolla"), "{screen}");
        assert!(screen.contains("2018 Honda Civic"), "{screen}");
    }

    #[tokio::test]
    async fn login_screen_masks_the_password() {
        let gateway = MemoryGateway::new();
        let path = std::env::temp_dir()
            .join(format!("lotbook_tui_{}", uuid::Uuid::new_v4()))
            .join("settings.json");
        let mut app = App::new(
            Inventory::new(gateway),
            SettingsStore::load(path).unwrap(),
            "dealer@lot.test",
        );
        app.state.login.password = "hunter2".to_string();

        let screen = draw(&app);
        assert!(screen.contains("dealer@lot.test"), "{screen}");
        assert!(!screen.contains("hunter2"), "{screen}");
    }

    #[tokio::test]
    async fn detail_lists_expenses_newest_first() {
        let mut app = demo_app().await;
        app.handle_action(keymap::AppAction::Input('/')).await;
        for ch in "civic".chars() {
            app.handle_action(keymap::AppAction::Input(ch)).await;
        }
        app.handle_action(keymap::AppAction::Submit).await;
        app.handle_action(keymap::AppAction::Submit).await;

        let screen = draw(&app);
        let detailing = screen.find("Detailing").unwrap();
        let brakes = screen.find("Brake pads").unwrap();
        assert!(detailing < brakes, "{screen}");
        assert!(screen.contains("Profit"), "{screen}");
    }
}

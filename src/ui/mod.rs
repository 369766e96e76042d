pub mod domains;
pub mod gauge;
pub mod help;
pub mod info;
pub mod navbar;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::app::{Dashboard, Mode};
use crate::config::Action;

pub fn render(dashboard: &Dashboard, frame: &mut Frame) {
    let palette = dashboard.palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        frame.area(),
    );

    let [top, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [cards, bottom] =
        Layout::vertical([Constraint::Percentage(60), Constraint::Fill(1)]).areas(body);
    let card_areas: [Rect; 3] = Layout::horizontal([Constraint::Fill(1); 3]).areas(cards);
    let [info_area, domains_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(bottom);

    navbar::render(dashboard, frame, top);
    for (gauge, area) in dashboard.view.gauges().iter().zip(card_areas) {
        gauge::render_card(gauge, palette, frame, area);
    }
    info::render(&dashboard.view.system_rows(), palette, frame, info_area);
    domains::render(dashboard, frame, domains_area);
    render_footer(dashboard, frame, footer);

    if dashboard.mode == Mode::Help {
        help::render(&dashboard.config.keys, palette, frame, frame.area());
    }
}

fn render_footer(dashboard: &Dashboard, frame: &mut Frame, area: Rect) {
    let palette = dashboard.palette();
    let left = format!(" {}", dashboard.config.connection.url);

    let hints: Vec<String> = dashboard
        .config
        .keys
        .bindings()
        .into_iter()
        .filter_map(|(action, keys)| {
            let word = match action {
                Action::ToggleTheme => "theme",
                Action::Help => "help",
                Action::Quit => "quit",
                Action::CloseHelp => return None,
            };
            Some(format!("{} {}", keys.first()?, word))
        })
        .collect();
    let right = format!("{} ", hints.join("  "));

    let padding = (area.width as usize).saturating_sub(left.chars().count() + right.chars().count());
    let line = Line::from(vec![
        Span::styled(left, Style::default().fg(palette.dim)),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, Style::default().fg(palette.dim)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}

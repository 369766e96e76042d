use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Text,
    widgets::{Block, BorderType, Borders, Cell, Row, Table},
    Frame,
};

use crate::app::Dashboard;

/// Monitored sites with their view counters from `log_status`.
pub fn render(dashboard: &Dashboard, frame: &mut Frame, area: Rect) {
    let palette = dashboard.palette();
    let snapshot = dashboard.view.snapshot();

    let block = Block::default()
        .title(" Domains ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(palette.card_bg).fg(palette.card_fg));

    let header = Row::new(["Domain", "Status", "View"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    // Status is not reported by the agent; every listed site shows Active
    let rows = dashboard.config.domains.iter().map(|domain| {
        Row::new(vec![
            Cell::from(domain.host.as_str()),
            Cell::from(Text::styled("Active", Style::default().fg(palette.active))),
            Cell::from(snapshot.log_entry(&domain.log_key)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Fill(3),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .column_spacing(2)
    .block(block);
    frame.render_widget(table, area);
}

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::Dashboard;

pub fn render(dashboard: &Dashboard, frame: &mut Frame, area: Rect) {
    let palette = dashboard.palette();
    let base = Style::default().bg(palette.navbar_bg).fg(palette.navbar_fg);

    let left = vec![Span::styled(
        " Dashboard ",
        Style::default().add_modifier(Modifier::BOLD),
    )];

    let (status, status_color) = if dashboard.view.connected() {
        ("Status: Connected", palette.connected)
    } else {
        ("Status: Disconnected", palette.disconnected)
    };
    let dot = if dashboard.pulse_on() { "●" } else { "○" };
    let updated = dashboard
        .view
        .last_update()
        .map(|t| format!("updated {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "waiting".to_string());

    let mut right = theme_switch(dashboard);
    right.extend([
        Span::raw("   "),
        Span::styled(status, Style::default().fg(status_color)),
        Span::raw(" "),
        Span::styled(dot, Style::default().fg(status_color)),
        Span::raw("   "),
        Span::raw(updated),
        Span::raw(" "),
    ]);

    let used: usize = left.iter().chain(right.iter()).map(|s| s.width()).sum();
    let padding = (area.width as usize).saturating_sub(used);

    let mut spans = left;
    spans.push(Span::raw(" ".repeat(padding)));
    spans.extend(right);

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

fn theme_switch(dashboard: &Dashboard) -> Vec<Span<'static>> {
    let palette = dashboard.palette();
    let knob = if dashboard.view.dark() { "■" } else { " " };
    vec![
        Span::styled("☀", Style::default().fg(palette.sun)),
        Span::raw(" ["),
        Span::raw(knob),
        Span::raw("] "),
        Span::styled("☾", Style::default().fg(palette.moon)),
    ]
}

#[cfg(test)]
mod tests {
    use crate::app::Dashboard;
    use crate::channel::ChannelEvent;
    use crate::ui::test_support::{dashboard, draw, rows};

    fn navbar(d: &Dashboard) -> String {
        rows(&draw(d, 100, 20)).remove(0)
    }

    #[test]
    fn test_navbar_light_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let d = dashboard(&dir);
        let line = navbar(&d);
        assert!(line.starts_with(" Dashboard"));
        assert!(line.contains("☀ [ ] ☾"));
        assert!(line.contains("Status: Disconnected ●"));
        assert!(line.contains("waiting"));
    }

    #[test]
    fn test_navbar_dark_connected_with_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(&dir);
        d.view.toggle_theme().unwrap();
        d.view.apply(ChannelEvent::Connect);
        d.view.apply(ChannelEvent::StatusUpdate(Default::default()));
        let line = navbar(&d);
        assert!(line.contains("☀ [■] ☾"));
        assert!(line.contains("Status: Connected"));
        assert!(line.contains("updated "));
        assert!(!line.contains("waiting"));
    }
}

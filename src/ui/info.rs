use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::config::Palette;

/// System info panel; rows come from the view model as label/value pairs.
pub fn render(rows: &[(&'static str, String)], palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" System Info ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(palette.card_bg).fg(palette.card_fg));

    let label_style = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::raw("")];
    for (label, value) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!(" {}: ", label), label_style),
            Span::raw(value.as_str()),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use crate::telemetry::{normalize, Reading};
    use crate::ui::test_support::{contains, dashboard, draw};
    use serde_json::json;

    #[test]
    fn test_info_panel_shows_system_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(&dir);
        let mut snapshot = normalize(json!({
            "cpu": {"processor": "Intel Xeon", "min": "0.80", "max": "3.10"},
            "system_info": {
                "os": "Linux",
                "os_version": "6.1",
                "uptime": {"days": 12, "hours": 3, "minutes": 7}
            }
        }))
        .unwrap();
        snapshot.cpu.current = Some(Reading::Number(1.0));
        d.view.on_snapshot(snapshot);

        let buffer = draw(&d, 160, 50);
        assert!(contains(&buffer, "Operating System: Linux 6.1"));
        assert!(contains(&buffer, "Processor: Intel Xeon"));
        assert!(contains(&buffer, "Uptime: 12 days 3 hours 7 minutes"));
        assert!(contains(&buffer, "CPU Range: 0.80 - 3.10 Ghz"));
    }

    #[test]
    fn test_info_panel_empty_without_system_info() {
        let dir = tempfile::tempdir().unwrap();
        let d = dashboard(&dir);
        let buffer = draw(&d, 160, 50);
        assert!(contains(&buffer, "Operating System: "));
        assert!(!contains(&buffer, "days"));
    }
}

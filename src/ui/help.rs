use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::config::{Action, KeyMap, Palette};

pub fn render(keys: &KeyMap, palette: &Palette, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 50, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" keybindings ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(palette.card_bg).fg(palette.card_fg));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default()
        .fg(palette.sun)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(palette.card_fg);

    let bindings = keys.bindings();
    let mut lines = vec![Line::raw("")];
    for (action, bound) in &bindings {
        let key = format!("    {:<16}", bound.join(", "));
        lines.push(line_entry(key, action.description(), key_style, desc_style));
    }
    if let Some(close) = close_key(&bindings) {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("  Press {} to close", close),
            Style::default().fg(palette.dim),
        ));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

// The help key toggles the overlay too, so it stands in when close_help is unbound
fn close_key(bindings: &[(Action, Vec<String>)]) -> Option<&str> {
    [Action::CloseHelp, Action::Help].iter().find_map(|wanted| {
        bindings
            .iter()
            .find(|(action, _)| action == wanted)
            .and_then(|(_, keys)| keys.first())
            .map(String::as_str)
    })
}

fn line_entry<'a>(key: String, desc: &'a str, key_style: Style, desc_style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(key, key_style),
        Span::styled(desc, desc_style),
    ])
}

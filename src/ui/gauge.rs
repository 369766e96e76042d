use std::f64::consts::TAU;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Painter, Shape},
        Block, BorderType, Borders, Paragraph,
    },
    Frame,
};

use crate::config::Palette;
use crate::view_model::{GaugeView, RING_CUTOUT, REMAINING_COLOR};

const ANGLE_STEPS: usize = 1440;
const RADIUS_STEPS: usize = 16;
/// Canvas extent beyond the unit circle so the ring is not clipped.
const MARGIN: f64 = 1.05;

/// Doughnut with two segments, filled clockwise from twelve o'clock.
///
/// `used` is a percentage and is not clamped: below zero (or NaN) the whole
/// ring shows as remaining, above 100 it is fully used.
pub struct Ring {
    pub used: f64,
    pub used_color: Color,
    pub remaining_color: Color,
    pub cutout: f64,
}

impl Shape for Ring {
    fn draw(&self, painter: &mut Painter) {
        let inner = self.cutout.clamp(0.0, 1.0);
        for r_step in 0..=RADIUS_STEPS {
            let r = inner + (1.0 - inner) * r_step as f64 / RADIUS_STEPS as f64;
            for a_step in 0..ANGLE_STEPS {
                let turn = a_step as f64 / ANGLE_STEPS as f64;
                let theta = turn * TAU;
                let (x, y) = (r * theta.sin(), r * theta.cos());
                let Some((px, py)) = painter.get_point(x, y) else {
                    continue;
                };
                let color = if turn * 100.0 < self.used {
                    self.used_color
                } else {
                    self.remaining_color
                };
                painter.paint(px, py, color);
            }
        }
    }
}

/// Canvas bounds that keep the ring round. Braille dots are roughly square,
/// two per cell across and four down.
pub fn canvas_bounds(area: Rect) -> ([f64; 2], [f64; 2]) {
    let dots_w = area.width as f64 * 2.0;
    let dots_h = area.height as f64 * 4.0;
    if dots_w == 0.0 || dots_h == 0.0 {
        return ([-MARGIN, MARGIN], [-MARGIN, MARGIN]);
    }
    if dots_w >= dots_h {
        let x = MARGIN * dots_w / dots_h;
        ([-x, x], [-MARGIN, MARGIN])
    } else {
        let y = MARGIN * dots_h / dots_w;
        ([-MARGIN, MARGIN], [-y, y])
    }
}

pub fn render_card(gauge: &GaugeView, palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(Line::from(format!(" {} ", gauge.metric.title())).alignment(Alignment::Center))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(palette.card_bg).fg(palette.card_fg))
        .border_style(Style::default().fg(palette.card_fg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [ring_area, _, rows_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(gauge.rows.len() as u16),
    ])
    .areas(inner);

    render_ring(gauge, palette, frame, ring_area);

    let label_style = Style::default().fg(palette.card_fg).add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = gauge
        .rows
        .iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{}: ", name), label_style),
                Span::raw(value.as_str()),
            ])
            .alignment(Alignment::Center)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), rows_area);
}

fn render_ring(gauge: &GaugeView, palette: &Palette, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (x_bounds, y_bounds) = canvas_bounds(area);
    let ring = Ring {
        used: gauge.used,
        used_color: gauge.metric.used_color(),
        remaining_color: REMAINING_COLOR,
        cutout: RING_CUTOUT,
    };
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .background_color(palette.card_bg)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| ctx.draw(&ring));
    frame.render_widget(canvas, area);

    // Percentage label in the hole
    let label_area = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
    let label = Paragraph::new(Line::from(gauge.label.as_str()))
        .alignment(Alignment::Center)
        .style(Style::default().fg(palette.card_fg).add_modifier(Modifier::BOLD));
    frame.render_widget(label, label_area);
}

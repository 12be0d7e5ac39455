//! Dashboard layout: rain in the back, headlines and counters in front.

use glyphdeck_config::CounterConfig;
use glyphdeck_core::Theme;
use glyphdeck_effects::{CounterBoard, CounterView, RainField, ScrambleView, TextScrambler};
use glyphdeck_fonts::DIGIT_HEIGHT;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::Paragraph,
};

/// Everything one dashboard frame draws.
#[derive(Debug)]
pub struct Dashboard<'a> {
    pub rain: &'a RainField,
    pub board: &'a CounterBoard,
    pub counters: &'a [CounterConfig],
    pub headlines: &'a [TextScrambler],
    pub theme: Theme,
    pub now_ms: u64,
    pub rain_paused: bool,
    pub online: bool,
}

impl Dashboard<'_> {
    fn label_for<'b>(&'b self, id: &'b str) -> &'b str {
        self.counters
            .iter()
            .find(|c| c.id == id)
            .map_or(id, |c| c.label.as_str())
    }
}

/// Draw the dashboard over the whole frame.
pub fn render(frame: &mut Frame, dashboard: &Dashboard) {
    let area = frame.area();
    let accent = dashboard.theme.accent();

    frame.render_widget(dashboard.rain, area);

    let chunks = Layout::vertical([
        Constraint::Fill(1),                                   // Top padding
        Constraint::Length(dashboard.headlines.len() as u16), // Headlines
        Constraint::Length(2),                                 // Spacing
        Constraint::Length(DIGIT_HEIGHT as u16),               // Counter digits
        Constraint::Length(1),                                 // Counter labels
        Constraint::Length(1),                                 // Counter deltas
        Constraint::Fill(1),                                   // Bottom padding
        Constraint::Length(1),                                 // Help text
    ])
    .split(area);

    render_headlines(frame, dashboard, chunks[1]);
    render_counters(frame, dashboard, [chunks[3], chunks[4], chunks[5]]);

    let status = if dashboard.online {
        " ● live".fg(accent)
    } else {
        " ○ offline".dark_gray()
    };
    let rain_action = if dashboard.rain_paused {
        " resume rain  "
    } else {
        " pause rain  "
    };
    let help = Line::from(vec![
        "q".bold().fg(accent),
        " quit  ".dark_gray(),
        "c".bold().fg(accent),
        " cycle color  ".dark_gray(),
        "p".bold().fg(accent),
        rain_action.dark_gray(),
        "r".bold().fg(accent),
        " replay ".dark_gray(),
        status,
    ])
    .centered();
    frame.render_widget(help, chunks[7]);
}

fn render_headlines(frame: &mut Frame, dashboard: &Dashboard, area: Rect) {
    if dashboard.headlines.is_empty() {
        return;
    }
    let rows = Layout::vertical(vec![Constraint::Length(1); dashboard.headlines.len()]).split(area);
    for (scrambler, row) in dashboard.headlines.iter().zip(rows.iter()) {
        let view = ScrambleView::new(scrambler)
            .animating_style(Style::new().fg(dashboard.theme.muted()))
            .done_style(Style::new().fg(dashboard.theme.accent()).bold())
            .alignment(Alignment::Center);
        frame.render_widget(view, *row);
    }
}

/// Signed percentage with two decimals, `+0.00%` for no change.
pub fn format_percentage(delta: f64) -> String {
    // -0.0 prints as +0.00%.
    let delta = if delta == 0.0 { 0.0 } else { delta };
    format!("{delta:+.2}%")
}

/// Draw counters side by side; `rows` are the digit, label and delta rows.
fn render_counters(frame: &mut Frame, dashboard: &Dashboard, rows: [Rect; 3]) {
    if dashboard.board.is_empty() {
        return;
    }
    let [digits, labels, deltas] = rows;
    let counters = dashboard.board.counters();
    let constraints = vec![Constraint::Fill(1); counters.len()];
    let digit_cells = Layout::horizontal(constraints.clone()).split(digits);
    let label_cells = Layout::horizontal(constraints.clone()).split(labels);
    let delta_cells = Layout::horizontal(constraints).split(deltas);

    let cells = digit_cells
        .iter()
        .zip(label_cells.iter())
        .zip(delta_cells.iter());
    for (counter, ((cell, label_cell), delta_cell)) in counters.iter().zip(cells) {
        let width = counter.display_width().min(cell.width);
        let x = cell.x + (cell.width - width) / 2;
        let view = CounterView::new(counter, dashboard.now_ms)
            .style(Style::new().fg(dashboard.theme.accent()));
        frame.render_widget(view, Rect::new(x, cell.y, width, cell.height));

        let label = Paragraph::new(dashboard.label_for(counter.id()))
            .style(Style::new().fg(dashboard.theme.muted()))
            .alignment(Alignment::Center);
        frame.render_widget(label, *label_cell);

        if let Some(delta) = counter.delta() {
            let style = if delta < 0.0 {
                Style::new().fg(dashboard.theme.muted())
            } else {
                Style::new().fg(dashboard.theme.accent())
            };
            let line = Paragraph::new(format_percentage(delta))
                .style(style)
                .alignment(Alignment::Center);
            frame.render_widget(line, *delta_cell);
        }
    }
}

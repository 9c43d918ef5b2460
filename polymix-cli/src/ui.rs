use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};

use crate::controls::StatusSnapshot;

const TITLE: &str = "polymix";

pub fn draw_status(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    status: &StatusSnapshot,
    log_lines: &[String],
) {
    let _ = terminal.draw(|f| {
        let status_height = status.text.lines().count().max(1) as u16 + 2;
        let meter_rows = status.levels.len().max(1) as u16;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(status_height),
                Constraint::Length(meter_rows + 2),
                Constraint::Min(0),
            ])
            .split(f.size());

        let title = Paragraph::new(TITLE).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(title, chunks[0]);

        let controls = Paragraph::new(
            "space=pause/resume  h=halt all  f=fade out 1s  -/= master volume  q=quit",
        )
        .style(Style::default().fg(Color::Blue))
        .block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(controls, chunks[1]);

        let status_widget = Paragraph::new(status.text.as_str())
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title("Channels"));
        f.render_widget(status_widget, chunks[2]);

        let meter_block = Block::default().borders(Borders::ALL).title("Output");
        let meter_area = meter_block.inner(chunks[3]);
        f.render_widget(meter_block, chunks[3]);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(1); meter_rows as usize])
            .split(meter_area);
        for (row, level) in rows.iter().zip(status.levels.iter()) {
            let ratio = level.clamp(0.0, 1.0) as f64;
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Yellow))
                .ratio(ratio)
                .label(format!("{:>5.1}%", ratio * 100.0));
            f.render_widget(gauge, *row);
        }

        let log_height = chunks[4].height.saturating_sub(2) as usize;
        let start = log_lines.len().saturating_sub(log_height);
        let log_text = if log_lines.is_empty() {
            "No logs yet.".to_string()
        } else {
            log_lines[start..].join("\n")
        };

        let log_widget = Paragraph::new(log_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        f.render_widget(log_widget, chunks[4]);
    });
}

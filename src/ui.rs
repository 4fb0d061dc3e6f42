use std::time::Duration;

use ratatui::{
    prelude::*,
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table},
};

use crate::simulation::{ObserverSnapshot, RgoSnapshot, format_number_commas};

#[derive(Debug, Clone)]
pub struct ControlState {
    pub paused: bool,
    pub tick_duration: Duration,
    pub api_addr: Option<String>,
}

pub fn render(frame: &mut Frame, snapshot: &ObserverSnapshot, control: &ControlState) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, main_layout[0], snapshot, control);
    render_rgo_table(frame, main_layout[1], snapshot);
    render_revenue_chart(frame, main_layout[2], snapshot);

    let keys = Paragraph::new(Line::from(vec![
        Span::styled(" space ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" pause  "),
        Span::styled(" +/- ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" speed  "),
        Span::styled(" r ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" reset  "),
        Span::styled(" q ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" quit"),
    ]));
    frame.render_widget(keys, main_layout[3]);
}

fn render_header(frame: &mut Frame, area: Rect, snapshot: &ObserverSnapshot, control: &ControlState) {
    let totals = &snapshot.totals;
    let status = if control.paused {
        Span::styled("PAUSED", Style::default().fg(Color::Yellow).bold())
    } else {
        Span::styled("LIVE", Style::default().fg(Color::LightGreen).bold())
    };

    let mut first_line = vec![
        Span::styled(" Mk.03 RGO Studio ", Style::default().bold()),
        Span::raw("| "),
        Span::styled(&snapshot.scenario, Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled(format!("Day {}", snapshot.day), Style::default().fg(Color::White)),
        Span::raw(" | "),
        status,
        Span::raw(format!(" · {} ms/day", control.tick_duration.as_millis())),
    ];
    if let Some(addr) = &control.api_addr {
        first_line.push(Span::raw(" · api "));
        first_line.push(Span::styled(addr.clone(), Style::default().fg(Color::LightBlue)));
    }

    let second_line = Line::from(vec![
        Span::raw("Population "),
        Span::styled(
            format_number_commas(snapshot.total_population.max(0) as u64),
            Style::default().fg(Color::White).bold(),
        ),
        Span::raw(" | Employed "),
        Span::styled(
            format_number_commas(totals.employed.max(0) as u64),
            Style::default().fg(Color::LightGreen),
        ),
        Span::raw(" | Revenue "),
        Span::styled(
            format!("{:.2}", totals.revenue),
            Style::default().fg(Color::LightYellow).bold(),
        ),
        Span::raw(" | Owners "),
        Span::styled(
            format!("{:.2}", totals.owner_income),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(" | Workers "),
        Span::styled(
            format!("{:.2}", totals.worker_income),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | Unpaid "),
        Span::styled(
            format!("{:.2}", totals.destroyed()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(vec![Line::from(first_line), second_line])
        .block(Block::new().borders(Borders::TOP | Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn rgo_row(row: &RgoSnapshot) -> Row<'static> {
    let idle = row.production_type.is_none();
    let style = if idle {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let employment = if row.max_employees > 0 {
        format!(
            "{} / {}",
            format_number_commas(row.employees.max(0) as u64),
            format_number_commas(row.max_employees as u64)
        )
    } else {
        "-".to_string()
    };

    Row::new(vec![
        Cell::from(row.province.clone()),
        Cell::from(row.state.clone().unwrap_or_else(|| "-".to_string())),
        Cell::from(row.good.clone().unwrap_or_else(|| "idle".to_string()))
            .style(Style::default().fg(Color::LightGreen)),
        Cell::from(format!("x{:.0}", row.size_multiplier)),
        Cell::from(employment),
        Cell::from(format!("{:.3}", row.output)),
        Cell::from(format!("{:.3}", row.unsold)).style(Style::default().fg(Color::DarkGray)),
        Cell::from(format!("{:.3}", row.revenue)).style(Style::default().fg(Color::LightYellow)),
        Cell::from(format!("{:.3}", row.owner_income)).style(Style::default().fg(Color::Magenta)),
        Cell::from(format!("{:.3}", row.employee_income)).style(Style::default().fg(Color::Cyan)),
    ])
    .style(style)
}

fn render_rgo_table(frame: &mut Frame, area: Rect, snapshot: &ObserverSnapshot) {
    let header_cells = [
        "Province", "State", "Good", "Size", "Employed", "Output", "Unsold", "Revenue", "Owners",
        "Workers",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(Style::default().fg(Color::White).bold()));
    let header = Row::new(header_cells).height(1).bottom_margin(1);
    let rows: Vec<Row> = snapshot.rgos.iter().map(rgo_row).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(12),
            Constraint::Percentage(11),
            Constraint::Percentage(8),
            Constraint::Percentage(5),
            Constraint::Percentage(18),
            Constraint::Percentage(9),
            Constraint::Percentage(7),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title("Resource Gathering Operations")
            .borders(Borders::ALL),
    );
    frame.render_widget(table, area);
}

/// Scales a float history into sparkline bars, newest last.
pub fn series_from_history(history: &[f64], scale: f64, limit: usize) -> Vec<u64> {
    let start = history.len().saturating_sub(limit);
    let mut series: Vec<u64> = history[start..]
        .iter()
        .map(|value| (value.max(0.0) * scale).round() as u64)
        .collect();
    if series.is_empty() {
        series.push(0);
    }
    series
}

fn render_revenue_chart(frame: &mut Frame, area: Rect, snapshot: &ObserverSnapshot) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let limit = halves[0].width.saturating_sub(2) as usize;
    let revenue_series = series_from_history(&snapshot.revenue_history, 100.0, limit);
    let revenue_line = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Daily revenue"),
        )
        .data(&revenue_series)
        .max(revenue_series.iter().cloned().max().unwrap_or(1).max(1))
        .style(Style::default().fg(Color::LightYellow));
    frame.render_widget(revenue_line, halves[0]);

    let employment: Vec<f64> = snapshot
        .employment_history
        .iter()
        .map(|employed| *employed as f64)
        .collect();
    let employment_series = series_from_history(&employment, 1.0, limit);
    let employment_line = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Employed pops"),
        )
        .data(&employment_series)
        .max(employment_series.iter().cloned().max().unwrap_or(1).max(1))
        .style(Style::default().fg(Color::LightGreen));
    frame.render_widget(employment_line, halves[1]);
}

//! TUI rendering functions

use super::app::TuiApp;
use crate::card::Card;
use crate::dashboard::SnapshotStatus;
use crate::live::StreamStatus;
use inspector_common::CapturedRequest;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState, Wrap,
    },
    Frame,
};

/// Draw the TUI
pub fn draw(frame: &mut Frame, app: &TuiApp) {
    match app.dashboard.focused_entry() {
        Some((_, record)) => draw_card_view(frame, app, record),
        None => draw_list_view(frame, app),
    }
}

/// Draw the header, the request list and the footer
fn draw_list_view(frame: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header with stream, snapshot and feed status
            Constraint::Min(3),    // Request table
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_requests(frame, app, chunks[1]);
    draw_footer(frame, chunks[2], Footer::List);
}

fn draw_header(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let stream = app.dashboard.stream_status();
    let stream_color = match stream {
        StreamStatus::Online => Color::Green,
        StreamStatus::Connecting | StreamStatus::Reconnecting => Color::Yellow,
        StreamStatus::Offline => Color::Red,
    };

    let (snapshot_text, snapshot_color) = match app.dashboard.snapshot_status() {
        SnapshotStatus::Loading => ("loading".to_string(), Color::Yellow),
        SnapshotStatus::Loaded(count) => (format!("{} stored", count), Color::White),
        SnapshotStatus::Failed(error) => (
            format!("unavailable ({})", truncate_str(error, 60)),
            Color::Red,
        ),
    };

    let feed = app.dashboard.feed();
    let feed_text = if feed.is_hydrated() {
        format!("{} live, {} stored", feed.live_len(), feed.snapshot_len())
    } else {
        format!("{} live, snapshot pending", feed.live_len())
    };

    let max_url_len = (area.width as usize).saturating_sub(20);

    let lines = vec![
        Line::from(vec![
            Span::styled("Backend         ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                truncate_str(&app.backend_url, max_url_len),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled("Live Stream     ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                stream.as_str(),
                Style::default().fg(stream_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Snapshot        ", Style::default().fg(Color::DarkGray)),
            Span::styled(snapshot_text, Style::default().fg(snapshot_color)),
        ]),
        Line::from(vec![
            Span::styled("Feed            ", Style::default().fg(Color::DarkGray)),
            Span::styled(feed_text, Style::default().fg(Color::White)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Draw every request, newest first, with selection and scrollbar
fn draw_requests(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let feed = app.dashboard.feed();

    // Time(9) + Method(7) + Client(16) + borders/padding
    let fixed_width = 9 + 7 + 16 + 8;
    let path_width = (area.width as usize).saturating_sub(fixed_width).max(10);

    let header = Row::new(vec!["Time", "Method", "Path", "Client"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .bottom_margin(0);

    let rows: Vec<Row> = feed
        .iter()
        .map(|req| {
            Row::new(vec![
                Cell::from(req.display_time()),
                Cell::from(format!("{:>6}", truncate_str(req.method_str(), 6)))
                    .style(method_style(req.method_str())),
                Cell::from(truncate_str(req.path_str(), path_width)),
                Cell::from(req.client_ip.clone().unwrap_or_default())
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let title = match feed.capacity() {
        Some(capacity) => format!(" Requests ({}/{}) ", feed.len(), capacity),
        None => format!(" Requests ({}) ", feed.len()),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(10),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));

    let mut state = TableState::default();
    if !feed.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(table, chunks[0], &mut state);

    if feed.is_empty() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Waiting for requests...",
            Style::default().fg(Color::DarkGray),
        )));
        let inner = Rect {
            x: chunks[0].x + 2,
            y: chunks[0].y + 2,
            width: chunks[0].width.saturating_sub(4),
            height: chunks[0].height.saturating_sub(3).min(1),
        };
        frame.render_widget(waiting, inner);
        return;
    }

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("▲"))
        .end_symbol(Some("▼"))
        .track_symbol(Some("│"))
        .thumb_symbol("█");

    let mut scrollbar_state = ScrollbarState::new(feed.len()).position(app.selected_index);

    frame.render_stateful_widget(scrollbar, chunks[1], &mut scrollbar_state);
}

/// Draw one request card over the whole screen
fn draw_card_view(frame: &mut Frame, app: &TuiApp, record: &CapturedRequest) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let card = Card::from_request(record);
    let label_width = card
        .fields
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0)
        + 2;

    let mut lines: Vec<Line> = card
        .fields
        .iter()
        .map(|field| {
            Line::from(vec![
                Span::styled(
                    format!("{:<width$}", field.label, width = label_width),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(field.value.clone(), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    for block in &card.blocks {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            block.label,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        lines.extend(
            block
                .text
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Yellow)))),
        );
    }

    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(record.method_str().to_string(), method_style(record.method_str())),
        Span::styled(
            format!(" {} ", record.path_str()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default()
        .title(title)
        .title(Line::from(Span::styled(" [x] close ", Style::default().fg(Color::Red))).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    frame.render_widget(paragraph, chunks[0]);
    let footer = if app.dashboard.fullscreen_active() {
        Footer::Fullscreen
    } else {
        Footer::Card
    };
    draw_footer(frame, chunks[1], footer);
}

/// Which key hints the footer shows
#[derive(Clone, Copy, PartialEq, Eq)]
enum Footer {
    List,
    /// Card focused, platform has not confirmed fullscreen yet
    Card,
    Fullscreen,
}

/// Draw the footer with key hints
fn draw_footer(frame: &mut Frame, area: Rect, footer: Footer) {
    let text = if footer == Footer::List {
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::styled(" Fullscreen  ", Style::default().fg(Color::DarkGray)),
            Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
            Span::styled(" Navigate  ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::styled(" Quit", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let mut spans = vec![
            Span::styled("x", Style::default().fg(Color::Cyan)),
            Span::styled(" Close  ", Style::default().fg(Color::DarkGray)),
        ];
        // Escape only works once the platform holds the fullscreen
        if footer == Footer::Fullscreen {
            spans.push(Span::styled("Esc", Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(" Exit fullscreen  ", Style::default().fg(Color::DarkGray)));
        }
        spans.extend([
            Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
            Span::styled(" Scroll  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Ctrl+C", Style::default().fg(Color::Cyan)),
            Span::styled(" Quit", Style::default().fg(Color::DarkGray)),
        ]);
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Get style for HTTP method
fn method_style(method: &str) -> Style {
    match method {
        "GET" => Style::default().fg(Color::Green),
        "POST" => Style::default().fg(Color::Yellow),
        "PUT" => Style::default().fg(Color::Blue),
        "PATCH" => Style::default().fg(Color::Magenta),
        "DELETE" => Style::default().fg(Color::Red),
        "HEAD" => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

/// Truncate to `max_len` characters
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_len).collect()
    }
}

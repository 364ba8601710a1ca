use crate::{
    app::App,
    colors::*,
    progress::ProgressSnapshot,
    utils::{format_size, percent_of, render_bar, truncate_path},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use std::{path::Path, time::Duration};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Length(1), // Directory info
            Constraint::Min(0),    // List
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    let [title_area, dir_info_area, list_area, footer_area] = *chunks else {
        return;
    };

    render_title_bar(f, title_area);
    render_directory_info(f, app, dir_info_area);
    render_file_list(f, app, list_area);
    render_footer(f, app, footer_area);

    if app.show_help {
        render_help_overlay(f);
    } else if app.pending_delete.is_some() {
        render_delete_prompt(f, app);
    }
}

fn render_title_bar(f: &mut Frame, area: Rect) {
    let version = env!("CARGO_PKG_VERSION");
    let terminal_width = f.area().width as usize;

    // " pdu vX.X.X    (press ? for help)"
    let title_len = 1 + 3 + 2 + version.len() + 8 + 1 + 10;
    let padding = terminal_width.saturating_sub(title_len);

    let title_bar = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled("pdu", Style::default().fg(COLOR_HEADER_FG).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" v{}    (press ", version)),
        Span::styled("?", Style::default().fg(COLOR_HEADER_FG).add_modifier(Modifier::BOLD)),
        Span::raw(" for help)"),
        Span::raw(" ".repeat(padding)),
    ]))
    .style(Style::default().fg(COLOR_HEADER_FG).bg(COLOR_HEADER_BG));
    f.render_widget(title_bar, area);
}

fn render_directory_info(f: &mut Frame, app: &App, area: Rect) {
    let node = &app.current_node;
    let dir_info = format!(
        " {}  {} ({} visible, {} items)",
        format_size(node.size()),
        node.path().display(),
        app.entries.len(),
        node.count(),
    );
    let dir_line = Paragraph::new(Line::from(vec![Span::styled(
        dir_info,
        Style::default().fg(COLOR_DIR_INFO),
    )]))
    .block(Block::default().borders(Borders::TOP | Borders::LEFT | Borders::RIGHT));
    f.render_widget(dir_line, area);
}

fn render_file_list(f: &mut Frame, app: &mut App, area: Rect) {
    let parent_size = app.current_total_size();

    let items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|node| {
            let size = node.size();
            let percent = percent_of(size, parent_size);
            let bar = render_bar(percent, 10);
            let name_color = if node.is_virtual() {
                COLOR_GROUP
            } else if node.is_dir() {
                COLOR_DIRECTORY
            } else {
                COLOR_FILE
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>10}", format_size(size)), Style::default().fg(COLOR_SIZE)),
                Span::raw(" | "),
                Span::styled(format!("{:>5.1}%", percent), Style::default().fg(COLOR_PERCENT)),
                Span::raw(" | "),
                Span::styled(format!("{:10}", bar), Style::default().fg(COLOR_PERCENT)),
                Span::raw(" | "),
                Span::styled(format!("{:>8}", node.count()), Style::default().fg(COLOR_COUNT)),
                Span::raw(" | "),
                Span::styled(node.label(), Style::default().fg(name_color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM))
        .highlight_style(Style::default().bg(COLOR_HIGHLIGHT_BG).fg(COLOR_HIGHLIGHT_FG));

    f.render_stateful_widget(list, area, &mut app.state);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let terminal_width = f.area().width as usize;
    let status_msg = app.status_message.as_deref().unwrap_or("");
    let sort_order = if app.sort_ascending { "ascending" } else { "descending" };
    let current_size = format_size(app.current_total_size());
    let footer_left = format!(
        "Sort mode: {} {}  Total disk usage: {}",
        app.sort_mode.name(),
        sort_order,
        current_size
    );
    let footer_right = if !status_msg.is_empty() {
        format!("  {}", status_msg)
    } else {
        String::new()
    };
    let footer_padding = terminal_width.saturating_sub(footer_left.len() + footer_right.len());
    let footer_text = format!("{}{:padding$}{}", footer_left, "", footer_right, padding = footer_padding);

    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(COLOR_HEADER_FG).bg(COLOR_HEADER_BG));
    f.render_widget(footer, area);
}

/// Rectangle of the given size centered in the frame
fn centered(f: &Frame, width: u16, height: u16) -> Rect {
    let area = f.area();
    Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn render_delete_prompt(f: &mut Frame, app: &App) {
    let Some(node) = &app.pending_delete else {
        return;
    };
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete \"{}\" ?", node.name()),
            Style::default().fg(COLOR_WARNING).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("  {}", format_size(node.size()))),
        Line::from(""),
        Line::from(Span::styled("  y: delete   any other key: cancel", Style::default().fg(COLOR_HELP_HINT))),
    ];

    let width = (node.name().chars().count() as u16).saturating_add(16).max(42);
    let prompt_area = centered(f, width, text.len() as u16 + 2);
    f.render_widget(Clear, prompt_area);
    let prompt = Paragraph::new(text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(" Confirm ")
            .style(Style::default().bg(Color::Black)))
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(prompt, prompt_area);
}

fn render_help_overlay(f: &mut Frame) {
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  pdu - Parallel Disk Usage Analyzer", Style::default().fg(COLOR_HELP_TITLE).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("  Navigation:", Style::default().fg(COLOR_HELP_HEADER).add_modifier(Modifier::BOLD))),
        Line::from("    j / ↓           Move down 1 item"),
        Line::from("    k / ↑           Move up 1 item"),
        Line::from("    Ctrl+d / PgDn   Move down 10 items"),
        Line::from("    Ctrl+u / PgUp   Move up 10 items"),
        Line::from("    H / Home        Go to first item"),
        Line::from("    G / End         Go to last item"),
        Line::from(""),
        Line::from(Span::styled("  Actions:", Style::default().fg(COLOR_HELP_HEADER).add_modifier(Modifier::BOLD))),
        Line::from("    o / l / Enter   Enter directory"),
        Line::from("    u / h / Bksp    Go up one level"),
        Line::from("    d               Delete selected entry"),
        Line::from(""),
        Line::from(Span::styled("  Display:", Style::default().fg(COLOR_HELP_HEADER).add_modifier(Modifier::BOLD))),
        Line::from("    s               Toggle sort by size"),
        Line::from("    m               Toggle sort by mtime"),
        Line::from("    c               Toggle sort by count"),
        Line::from(""),
        Line::from(Span::styled("  Other:", Style::default().fg(COLOR_HELP_HEADER).add_modifier(Modifier::BOLD))),
        Line::from("    ?               Toggle this help"),
        Line::from("    q / Esc         Quit"),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", Style::default().fg(COLOR_HELP_HINT))),
        Line::from(""),
    ];

    let help_area = centered(f, 42, help_text.len() as u16 + 2);
    f.render_widget(Clear, help_area);
    let help_block = Paragraph::new(help_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::default().bg(Color::Black)))
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(help_block, help_area);
}

/// Progress screen shown while the scan is running
pub fn render_scanning(f: &mut Frame, root: &Path, progress: &ProgressSnapshot, elapsed: Duration) {
    let dots = ".".repeat((elapsed.as_millis() / 500 % 7) as usize);
    let current = progress
        .current_path
        .as_deref()
        .map(|p| truncate_path(p, 40))
        .unwrap_or_else(|| "/".to_string());

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Scanning {}{}", root.display(), dots),
            Style::default().fg(COLOR_HELP_TITLE).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  Path:  {}", current)),
        Line::from(format!("  Size:  {}", format_size(progress.total_bytes))),
        Line::from(format!("  Items: {}", progress.total_items)),
        Line::from(format!("  Time:  {}s", elapsed.as_secs())),
        Line::from(""),
        Line::from(Span::styled("  q / Esc / Ctrl+c to abort", Style::default().fg(COLOR_HELP_HINT))),
    ];

    let area = centered(f, 56, text.len() as u16 + 2);
    f.render_widget(Clear, area);
    let block = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(" pdu "))
        .style(Style::default().fg(Color::White));
    f.render_widget(block, area);
}

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode};
use crate::state::Role;

const SEND_LABEL: &str = " Send ";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(len) = after_open.find("**") else {
            break;
        };
        if len == 0 {
            // "****" has nothing to embolden, keep it literal
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &rest[start + 4..];
            continue;
        }

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after_open[..len].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[len + 2..];
    }

    // Unclosed ** is treated as literal text
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Shopping Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for turn in app.session.turns() {
        match turn.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                )));
                for line in turn.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Role::Agent => {
                lines.push(Line::from(Span::styled(
                    "Agent:",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                for line in turn.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_pending() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Agent is typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Chat list text with the wrapping used on screen, without border or scroll
fn chat_paragraph(app: &App) -> Paragraph<'static> {
    let text = if app.session.turns().is_empty() && !app.session.is_pending() {
        Text::from(Span::styled(
            "Ask the assistant about a product...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(chat_lines(app))
    };

    // No trimming: turns are shown exactly as stored
    Paragraph::new(text).wrap(Wrap { trim: false })
}

/// Rendered height of the chat list at `width` columns
pub fn chat_line_count(app: &App, width: u16) -> u16 {
    let count = chat_paragraph(app).line_count(width);
    u16::try_from(count).unwrap_or(u16::MAX)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.clamp_chat_scroll();

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.backend.endpoint()));

    let chat = chat_paragraph(app)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    let total_lines = app.total_chat_lines();
    if total_lines > app.chat_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines.saturating_sub(app.chat_height) as usize)
            .position(app.chat_scroll as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None);
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let [draft_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SEND_LABEL.len() as u16 + 2),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Message ");

    // Inner width = total width - 2 (for borders)
    let inner_width = draft_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_col) = visible_draft(app.session.draft(), app.session.cursor(), inner_width);

    let input = if app.session.draft().is_empty() {
        Paragraph::new("Type your message…").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Blue))
    };

    frame.render_widget(input.block(input_block), draft_area);

    // Send control is disabled while a request is in flight
    let button_style = if app.session.is_pending() {
        Style::default().fg(Color::DarkGray)
    } else if app.session.can_send() {
        Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };
    let button = Paragraph::new(Span::styled(SEND_LABEL, button_style)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(button, button_area);

    // Show cursor when editing
    if editing {
        let cursor_x = cursor_col as u16;
        frame.set_cursor_position((draft_area.x + cursor_x + 1, draft_area.y + 1));
    }
}

/// Part of the draft that fits in `width` columns with the cursor in view,
/// and the cursor's column within it. Columns are display width, so wide
/// glyphs count double.
fn visible_draft(draft: &str, cursor: usize, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }

    let widths: Vec<usize> = draft.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Drop leading characters until the cursor column fits
    let mut start = 0;
    let mut cursor_col: usize = widths[..cursor].iter().sum();
    while start < cursor && cursor_col >= width {
        cursor_col -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible = draft
        .chars()
        .zip(&widths)
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, cursor_col)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(if app.session.is_pending() { " waiting " } else { " send " }, label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
            Span::styled(" Ctrl-C ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

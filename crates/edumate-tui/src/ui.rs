use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, FocusPane, InputMode};
use edumate_core::{Role, SessionState};

pub const SUBMIT_LABEL: &str = " Generate (Enter) ";
pub const WORKING_LABEL: &str = " Working... ";
pub const NO_OUTPUT: &str = "Generated code and narration will appear here.";
pub const NO_VIDEO: &str = "No video available.";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn label_line(label: &'static str, color: Color) -> Line<'static> {
    Line::from(Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)))
}

/// Chat log as styled lines, in log order
pub fn chat_text(session: &SessionState, animation_frame: u8) -> Text<'static> {
    if session.messages().is_empty() && !session.in_flight() {
        return Text::from(Span::styled(
            "Ask about a concept, e.g. \"Explain the Pythagorean theorem\"",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in session.messages() {
        match msg.role {
            Role::User => {
                lines.push(label_line("You:", Color::Cyan));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Role::Assistant => {
                lines.push(label_line("EduMate:", Color::Yellow));
                if !msg.is_flagged() {
                    for line in msg.text.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                } else {
                    for line in msg.text.lines() {
                        lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Red))));
                    }
                }
            }
        }
        lines.push(Line::default());
    }

    if session.in_flight() {
        lines.push(label_line("EduMate:", Color::Yellow));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize % 3) + 1);
        lines.push(Line::from(Span::styled(
            format!("Working{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

/// Output pane content: code, narration, and video reference
pub fn output_text(session: &SessionState, show_video: bool) -> Text<'static> {
    let Some(result) = session.result() else {
        return Text::from(Span::styled(NO_OUTPUT, Style::default().fg(Color::DarkGray)));
    };

    let heading = |title: &'static str| label_line(title, Color::Magenta);
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(heading("Code"));
    for line in result.code.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Green))));
    }
    lines.push(Line::default());

    lines.push(heading("Narration"));
    for line in result.narration.lines() {
        lines.push(Line::from(line.to_string()));
    }

    if show_video {
        lines.push(Line::default());
        lines.push(heading("Video"));
        match &result.video_url {
            Some(url) => lines.push(Line::from(vec![
                Span::raw("▶ "),
                Span::styled(url.clone(), Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)),
            ])),
            None => lines.push(Line::from(Span::styled(NO_VIDEO, Style::default().fg(Color::DarkGray)))),
        }
    }

    Text::from(lines)
}

pub fn submit_label(session: &SessionState) -> &'static str {
    if session.in_flight() {
        WORKING_LABEL
    } else {
        SUBMIT_LABEL
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [left_area, output_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(body_area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(left_area);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_output(app, frame, output_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" EduMate ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("{} messages", app.session.messages().len()),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn border_color(app: &App, pane: FocusPane) -> Color {
    if app.focus == pane {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn chat_paragraph(session: &SessionState, animation_frame: u8) -> Paragraph<'static> {
    Paragraph::new(chat_text(session, animation_frame)).wrap(Wrap { trim: true })
}

/// Rows the chat log occupies once wrapped to `width`, exactly as rendered
pub fn chat_line_count(session: &SessionState, animation_frame: u8, width: u16) -> usize {
    chat_paragraph(session, animation_frame).line_count(width)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store for mouse hit-testing and scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app, FocusPane::Chat)))
        .title(" Conversation ");

    let chat = chat_paragraph(&app.session, app.animation_frame)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border = if app.session.in_flight() {
        Color::DarkGray
    } else if editing || app.focus == FocusPane::Input {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Prompt ")
        .title_bottom(Line::from(submit_label(&app.session)).right_aligned());

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.session.draft()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_output(app: &mut App, frame: &mut Frame, area: Rect) {
    app.output_area = Some(area);
    app.output_height = area.height.saturating_sub(2);

    // No trimming: generated code keeps its indentation
    let output = Paragraph::new(output_text(&app.session, app.dispatcher.policy().show_video))
        .wrap(Wrap { trim: false });
    let wrapped = output.line_count(area.width.saturating_sub(2));
    app.output_lines = wrapped.min(u16::MAX as usize) as u16;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app, FocusPane::Output)))
        .title(" Output ");

    let output = output.block(block).scroll((app.output_scroll, 0));

    frame.render_widget(output, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " PROMPT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(if app.session.in_flight() { " working " } else { " generate " }, label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" prompt ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" copy code ", label_style),
            Span::styled(" o ", key_style),
            Span::styled(" open video ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    if let Some(status) = &app.status {
        hints.push(Span::styled(format!(" {} ", status), Style::default().fg(Color::Yellow)));
    }

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

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, ConnStatus};
use crate::markdown;
use crate::protocol::Author;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status_text, status_color) = match app.status {
        ConnStatus::Connecting => ("connecting", Color::Yellow),
        ConnStatus::Open => ("connected", Color::Green),
        ConnStatus::Closed => ("disconnected", Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" parley ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("#{} ", app.conversation_id),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("[{}]", status_text), Style::default().fg(status_color)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store pane dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let text = if app.transcript.is_empty() && !app.show_activity() {
        Text::from(Span::styled(
            "Type a message and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(transcript_lines(app))
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);
}

/// Flatten the transcript (plus the activity line) into display lines.
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for bubble in app.transcript.bubbles() {
        let (label, label_color) = match bubble.author {
            Author::User => ("You:", Color::Cyan),
            Author::Assistant => ("AI:", Color::Yellow),
        };
        lines.push(Line::from(vec![
            Span::styled(
                label,
                Style::default()
                    .fg(label_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                bubble.timestamp.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        if bubble.finalized {
            // Stream is complete: render the accumulated text as markdown
            lines.extend(markdown::render(&bubble.content));
        } else {
            // Raw text, newlines become line breaks
            for line in bubble.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        lines.push(Line::default());
    }

    if app.show_activity() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let note = app.activity.as_deref().unwrap_or("Thinking");
        lines.push(Line::from(Span::styled(
            format!("{}{}", note, dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Up/Down ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" C-u/C-d ", key_style),
        Span::styled(" page ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerFrame;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn streaming_bubble_renders_raw_markdown_source() {
        let mut app = App::new(1247);
        app.apply_frame(ServerFrame::Chunk("some **bold** text".to_string()));

        let lines = transcript_lines(&app);
        // Header line, content line, trailing blank
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "some **bold** text");
        assert_eq!(lines[1].spans.len(), 1);
    }

    #[test]
    fn finalized_bubble_renders_styled_markdown() {
        let mut app = App::new(1247);
        app.apply_frame(ServerFrame::Chunk("some **bo".to_string()));
        app.apply_frame(ServerFrame::Chunk("ld** text".to_string()));
        app.apply_frame(ServerFrame::StreamEnd);

        let lines = transcript_lines(&app);
        let rendered = markdown::render("some **bold** text");
        assert_eq!(line_text(&lines[1]), line_text(&rendered[0]));
        assert!(lines[1]
            .spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn activity_line_shows_the_think_note() {
        let mut app = App::new(1247);
        app.apply_frame(ServerFrame::Think("Currently analyzing 5 webpages.".to_string()));
        app.animation_frame = 2;

        let lines = transcript_lines(&app);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[1]), "Currently analyzing 5 webpages....");
    }

    #[test]
    fn bubble_header_carries_label_and_timestamp() {
        let mut app = App::new(1247);
        app.apply_frame(ServerFrame::History(vec![crate::protocol::HistoryEntry {
            author: Author::User,
            content: "hi".to_string(),
        }]));

        let lines = transcript_lines(&app);
        let header = line_text(&lines[0]);
        assert!(header.starts_with("You: "));
        assert!(header.ends_with("AM") || header.ends_with("PM"));
    }
}

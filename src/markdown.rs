//! Markdown styling for finalized streamed responses.
//!
//! Invoked only at stream finalization: the accumulated raw text of the last
//! assistant bubble is converted to styled terminal lines. Content is styled
//! as inert spans, never interpreted as markup.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render markdown source to styled lines, one per source line.
pub fn render(text: &str) -> Vec<Line<'static>> {
    text.lines().map(render_line).collect()
}

fn render_line(line: &str) -> Line<'static> {
    // Headings: style the whole line, strip the marker run
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes > 0 && line.chars().nth(hashes) == Some(' ') {
        return Line::from(Span::styled(
            line[hashes + 1..].to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
    }

    // Bullets: replace the marker, style the rest inline
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        let mut spans = vec![Span::styled("• ", Style::default().fg(Color::Yellow))];
        spans.extend(inline_spans(rest));
        return Line::from(spans);
    }

    let spans = inline_spans(line);
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Convert `**bold**` runs in a line to styled spans; everything else is raw.
fn inline_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
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

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn plain_text_passes_through() {
        let lines = render("just a sentence");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "just a sentence");
    }

    #[test]
    fn bold_run_becomes_a_styled_span() {
        let lines = render("an **important** word");
        let line = &lines[0];
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "important");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn unterminated_bold_is_literal() {
        let lines = render("half **open");
        assert_eq!(line_text(&lines[0]), "half **open");
    }

    #[test]
    fn heading_strips_marker_and_styles_line() {
        let lines = render("## Sources");
        assert_eq!(line_text(&lines[0]), "Sources");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn hashes_without_space_are_not_a_heading() {
        let lines = render("#hashtag");
        assert_eq!(line_text(&lines[0]), "#hashtag");
    }

    #[test]
    fn bullet_marker_is_replaced() {
        let lines = render("- first point\n* second point");
        assert_eq!(line_text(&lines[0]), "• first point");
        assert_eq!(line_text(&lines[1]), "• second point");
    }

    #[test]
    fn one_output_line_per_source_line() {
        let lines = render("a\n\nb");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn render_is_stable_over_concatenated_chunks() {
        // Finalization renders the accumulated text in one pass; streaming
        // chunk boundaries must not affect the result.
        let whole = render("some **bold** text");
        let concatenated = render(&format!("{}{}", "some **bo", "ld** text"));
        assert_eq!(whole.len(), concatenated.len());
        for (a, b) in whole.iter().zip(concatenated.iter()) {
            assert_eq!(line_text(a), line_text(b));
            assert_eq!(a.spans.len(), b.spans.len());
        }
    }
}

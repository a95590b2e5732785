//! The visible message list and its streaming state machine.
//!
//! A bubble goes `new -> accumulating -> finalized`. Only the most recent
//! assistant bubble can accumulate chunks; once finalized it is closed and
//! any later chunk starts a fresh bubble.

use chrono::{Local, Timelike};
use tracing::debug;

use crate::protocol::{Author, HistoryEntry};

/// One rendered chat message.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub author: Author,
    pub content: String,
    /// Render-time wall clock, not message-arrival time.
    pub timestamp: String,
    /// Set once the stream-end signal arrives; the UI then renders the
    /// accumulated text through the markdown styler.
    pub finalized: bool,
}

#[derive(Debug, Default)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Append a new bubble classed by author, stamped with the current time.
    pub fn append_message(&mut self, author: Author, content: impl Into<String>) {
        self.bubbles.push(Bubble {
            author,
            content: content.into(),
            timestamp: now_stamp(),
            finalized: false,
        });
    }

    /// Append a streamed chunk to the in-progress assistant bubble, or start
    /// a new one if the last bubble is a user message or already finalized.
    pub fn push_chunk(&mut self, chunk: &str) {
        match self.bubbles.last_mut() {
            Some(last) if last.author == Author::Assistant && !last.finalized => {
                last.content.push_str(chunk);
            }
            _ => self.append_message(Author::Assistant, chunk),
        }
    }

    /// Remove every bubble (session reset, or a history snapshot replacing
    /// the transcript).
    pub fn clear(&mut self) {
        self.bubbles.clear();
    }

    /// Replace the transcript with a history snapshot.
    pub fn replace_with_history(&mut self, entries: Vec<HistoryEntry>) {
        self.clear();
        for entry in entries {
            self.append_message(entry.author, entry.content);
        }
    }

    /// Mark the most recent streamed assistant bubble finalized. Returns
    /// whether anything changed; repeated calls and calls with no streamed
    /// bubble are no-ops.
    pub fn finalize_last_stream(&mut self) -> bool {
        match self
            .bubbles
            .iter_mut()
            .rev()
            .find(|bubble| bubble.author == Author::Assistant)
        {
            Some(bubble) if !bubble.finalized => {
                bubble.finalized = true;
                true
            }
            Some(_) => false,
            None => {
                debug!("stream_end with no assistant bubble to finalize");
                false
            }
        }
    }
}

/// 12-hour `H:MM AM/PM`; the hour '0' renders as '12'.
pub fn format_time(hour: u32, minute: u32) -> String {
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let mut display_hour = hour % 12;
    if display_hour == 0 {
        display_hour = 12;
    }
    format!("{}:{:02} {}", display_hour, minute, meridiem)
}

fn now_stamp() -> String {
    let now = Local::now();
    format_time(now.hour(), now.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_chunks_accumulate_into_one_bubble() {
        let mut transcript = Transcript::new();
        transcript.push_chunk("The ");
        transcript.push_chunk("capital ");
        transcript.push_chunk("of France");

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.bubbles()[0].content, "The capital of France");
        assert_eq!(transcript.bubbles()[0].author, Author::Assistant);
    }

    #[test]
    fn user_message_interrupts_accumulation() {
        let mut transcript = Transcript::new();
        transcript.push_chunk("first response");
        transcript.append_message(Author::User, "follow-up");
        transcript.push_chunk("second response");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.bubbles()[2].content, "second response");
    }

    #[test]
    fn finalize_marks_last_streamed_bubble() {
        let mut transcript = Transcript::new();
        transcript.push_chunk("done");
        assert!(transcript.finalize_last_stream());
        assert!(transcript.bubbles()[0].finalized);
    }

    #[test]
    fn repeated_finalize_is_a_no_op() {
        let mut transcript = Transcript::new();
        transcript.push_chunk("done");
        assert!(transcript.finalize_last_stream());
        assert!(!transcript.finalize_last_stream());
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn finalize_with_no_assistant_bubble_is_a_no_op() {
        let mut transcript = Transcript::new();
        assert!(!transcript.finalize_last_stream());

        transcript.append_message(Author::User, "anyone there?");
        assert!(!transcript.finalize_last_stream());
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn finalize_reaches_past_a_trailing_user_message() {
        let mut transcript = Transcript::new();
        transcript.push_chunk("streamed answer");
        transcript.append_message(Author::User, "quick follow-up");
        assert!(transcript.finalize_last_stream());
        assert!(transcript.bubbles()[0].finalized);
    }

    #[test]
    fn finalized_bubble_is_not_an_append_target() {
        let mut transcript = Transcript::new();
        transcript.push_chunk("first");
        transcript.finalize_last_stream();
        transcript.push_chunk("second");

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.bubbles()[0].content, "first");
        assert_eq!(transcript.bubbles()[1].content, "second");
        assert!(!transcript.bubbles()[1].finalized);
    }

    #[test]
    fn clear_then_append_leaves_exactly_one_bubble() {
        let mut transcript = Transcript::new();
        transcript.append_message(Author::User, "hi");
        transcript.push_chunk("hello");
        transcript.clear();
        transcript.append_message(Author::User, "fresh start");

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.bubbles()[0].content, "fresh start");
    }

    #[test]
    fn history_snapshot_replaces_transcript_in_order() {
        let mut transcript = Transcript::new();
        transcript.append_message(Author::User, "stale");

        transcript.replace_with_history(vec![
            HistoryEntry {
                author: Author::User,
                content: "hi".to_string(),
            },
            HistoryEntry {
                author: Author::Assistant,
                content: "hello".to_string(),
            },
        ]);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.bubbles()[0].author, Author::User);
        assert_eq!(transcript.bubbles()[0].content, "hi");
        assert_eq!(transcript.bubbles()[1].author, Author::Assistant);
        assert_eq!(transcript.bubbles()[1].content, "hello");
    }

    #[test]
    fn midnight_renders_as_twelve_am() {
        assert_eq!(format_time(0, 5), "12:05 AM");
    }

    #[test]
    fn afternoon_wraps_to_twelve_hour_clock() {
        assert_eq!(format_time(13, 30), "1:30 PM");
    }

    #[test]
    fn noon_is_twelve_pm() {
        assert_eq!(format_time(12, 0), "12:00 PM");
    }

    #[test]
    fn minutes_are_zero_padded() {
        assert_eq!(format_time(9, 7), "9:07 AM");
        assert_eq!(format_time(23, 59), "11:59 PM");
    }
}

use tracing::info;

use crate::connection::ChatConnection;
use crate::protocol::{Author, Outgoing, ServerFrame};
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatus {
    Connecting,
    Open,
    Closed,
}

/// The application context: constructed once at startup and passed to the
/// handler and renderer. Owns the transcript, the input line and the
/// connection handle; there is no module-level state.
pub struct App {
    pub should_quit: bool,
    pub conversation_id: i64,
    pub status: ConnStatus,
    pub connection: Option<ChatConnection>,

    pub transcript: Transcript,
    /// Backend status note (a `think` frame) shown on the activity line.
    pub activity: Option<String>,
    /// True between submitting a message and the first streamed chunk.
    pub awaiting_response: bool,

    // Input line state
    pub input: String,
    pub input_cursor: usize,

    // Transcript pane state, updated during render
    pub transcript_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state: 0-2 for the ellipsis on the activity line
    pub animation_frame: u8,
}

impl App {
    pub fn new(conversation_id: i64) -> Self {
        Self {
            should_quit: false,
            conversation_id,
            status: ConnStatus::Connecting,
            connection: None,

            transcript: Transcript::new(),
            activity: None,
            awaiting_response: false,

            input: String::new(),
            input_cursor: 0,

            transcript_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,
        }
    }

    /// Apply one decoded inbound frame to the transcript.
    pub fn apply_frame(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::History(entries) => {
                self.transcript.replace_with_history(entries);
                self.scroll_transcript_to_bottom();
            }
            ServerFrame::NewSession => {
                self.transcript.clear();
                self.awaiting_response = false;
                self.activity = None;
                self.transcript_scroll = 0;
            }
            ServerFrame::StreamEnd => {
                self.transcript.finalize_last_stream();
                self.awaiting_response = false;
                self.activity = None;
                self.scroll_transcript_to_bottom();
            }
            ServerFrame::Think(message) => {
                self.activity = Some(message);
                self.scroll_transcript_to_bottom();
            }
            ServerFrame::Chunk(text) => {
                self.transcript.push_chunk(&text);
                self.awaiting_response = false;
                self.activity = None;
                self.scroll_transcript_to_bottom();
            }
            ServerFrame::RawObject(value) => {
                // Untyped JSON is still response content; render it as text
                self.transcript.push_chunk(&value.to_string());
                self.awaiting_response = false;
                self.activity = None;
                self.scroll_transcript_to_bottom();
            }
        }
    }

    pub fn on_opened(&mut self) {
        info!(conversation_id = self.conversation_id, "connection open");
        self.status = ConnStatus::Open;
    }

    pub fn on_conn_error(&mut self, message: &str) {
        self.status = ConnStatus::Closed;
        self.awaiting_response = false;
        self.activity = None;
        self.transcript
            .append_message(Author::Assistant, format!("Connection error: {}", message));
        self.scroll_transcript_to_bottom();
    }

    pub fn on_closed(&mut self, reason: &str) {
        self.status = ConnStatus::Closed;
        self.awaiting_response = false;
        self.activity = None;
        self.transcript
            .append_message(Author::Assistant, format!("Connection closed: {}", reason));
        self.scroll_transcript_to_bottom();
    }

    /// Submit the input line. The message only reaches the transcript once
    /// the connection accepts it; otherwise the input stays put and the
    /// failure is surfaced on the activity line.
    pub fn submit_input(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }

        let sent = self
            .connection
            .as_ref()
            .map(|conn| conn.send(Outgoing::Text(self.input.clone())))
            .unwrap_or(false);

        if !sent {
            self.activity = Some("not connected, message not sent".to_string());
            return;
        }

        let content = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.transcript.append_message(Author::User, content);
        self.awaiting_response = true;
        self.activity = None;
        self.scroll_transcript_to_bottom();
    }

    /// Whether the activity line (think note or "Thinking...") is visible.
    pub fn show_activity(&self) -> bool {
        self.awaiting_response || self.activity.is_some()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.show_activity() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_add(1);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(self.chat_height / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_add(self.chat_height / 2);
    }

    /// Scroll so the newest entry (and the activity line) is visible.
    pub fn scroll_transcript_to_bottom(&mut self) {
        // Use actual pane width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for bubble in self.transcript.bubbles() {
            total_lines += 1; // Author and timestamp line
            for line in bubble.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after bubble
        }

        if self.show_activity() {
            total_lines += 2; // "AI:" + activity text
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.transcript_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.transcript_scroll = 0;
        }
    }
}

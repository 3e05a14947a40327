use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use edumate_core::{Dispatcher, FailureCause, Outcome, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Output,
    Input,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    pub session: SessionState,
    pub cursor: usize, // cursor position in the draft, in chars
    pub dispatcher: Dispatcher,
    pub pending: Option<JoinHandle<Outcome>>,

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height, for scroll calculations
    pub chat_width: u16,  // Inner width, for wrap calculations
    seen_revision: u64,

    // Output pane
    pub output_scroll: u16,
    pub output_height: u16,
    pub output_lines: u16,

    // One-line notice shown in the footer (clipboard, opener)
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub output_area: Option<Rect>,
}

impl App {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            session: SessionState::new(),
            cursor: 0,
            dispatcher,
            pending: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            seen_revision: 0,

            output_scroll: 0,
            output_height: 0,
            output_lines: 0,

            status: None,
            animation_frame: 0,

            chat_area: None,
            output_area: None,
        }
    }

    /// Submit the current draft. Blank drafts and submissions while a
    /// request is running do nothing.
    pub fn submit(&mut self) {
        let Some(prompt) = self.session.begin_submit() else {
            return;
        };
        self.cursor = 0;
        self.status = None;

        let dispatcher = self.dispatcher.clone();
        self.pending = Some(tokio::spawn(async move {
            dispatcher.dispatch(&prompt).await
        }));
    }

    /// Apply the outcome of a finished request, if there is one
    pub async fn poll_pending(&mut self) {
        let finished = self.pending.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }
        let Some(task) = self.pending.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "generate task did not complete");
                Outcome::Failed(FailureCause::Aborted)
            }
        };
        let policy = *self.dispatcher.policy();
        self.session.complete(outcome, &policy);
        self.output_scroll = 0;
    }

    /// Drop any running request; the backend is not told
    pub fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Scroll the chat to the newest message whenever the log grew
    pub fn sync_log_scroll(&mut self) {
        let revision = self.session.log_revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll_chat_to_bottom();
        }
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };

        let total_lines = crate::ui::chat_line_count(&self.session, self.animation_frame, wrap_width);
        let max_scroll = total_lines.saturating_sub(visible_height as usize);
        self.chat_scroll = max_scroll.min(u16::MAX as usize) as u16;
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_output_down(&mut self, lines: u16) {
        let max_scroll = self.output_lines.saturating_sub(self.output_height);
        self.output_scroll = (self.output_scroll.saturating_add(lines)).min(max_scroll);
    }

    pub fn scroll_output_up(&mut self, lines: u16) {
        self.output_scroll = self.output_scroll.saturating_sub(lines);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn focus_input(&mut self) {
        self.focus = FocusPane::Input;
        self.input_mode = InputMode::Editing;
        // Cursor at end of existing text
        self.cursor = self.session.draft().chars().count();
    }

    // Draft editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(self.session.draft(), self.cursor);
        self.session.draft_mut().insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(self.session.draft(), self.cursor);
            self.session.draft_mut().remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let char_count = self.session.draft().chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(self.session.draft(), self.cursor);
            self.session.draft_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.draft().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.session.draft().chars().count();
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{app_with, finish};
    use super::*;
    use edumate_core::{GenerateResponse, OutputPolicy};

    #[test]
    fn editing_is_utf8_safe() {
        let mut app = app_with("{}");
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.cursor_left();
        app.delete_before_cursor();
        assert_eq!(app.session.draft(), "hllo");
        app.insert_char('é');
        app.cursor_end();
        app.delete_at_cursor();
        assert_eq!(app.session.draft(), "héllo");
        assert_eq!(app.cursor, 5);
    }

    #[tokio::test]
    async fn submit_round_trip_clears_in_flight() {
        let mut app = app_with(r#"{"explanation":"E","code":"C","narration":"N"}"#);
        app.session.set_draft("fractions");
        app.cursor_end();

        app.submit();
        assert!(app.session.in_flight());
        assert_eq!(app.session.messages().len(), 1);
        assert_eq!(app.cursor, 0);

        finish(&mut app).await;

        assert!(!app.session.in_flight());
        assert!(app.pending.is_none());
        assert_eq!(app.session.messages()[1].text, "E");
        assert_eq!(app.session.result().unwrap().code, "C");
    }

    #[tokio::test]
    async fn aborted_task_still_clears_in_flight() {
        let mut app = app_with("{}");
        app.session.set_draft("topic");
        app.session.begin_submit();
        app.pending = Some(tokio::spawn(async {
            std::future::pending::<Outcome>().await
        }));
        if let Some(task) = app.pending.as_ref() {
            task.abort();
        }

        finish(&mut app).await;

        assert!(!app.session.in_flight());
        let last = app.session.messages().last().unwrap();
        assert_eq!(last.text, FailureCause::Aborted.notice());
    }

    #[test]
    fn chat_scroll_follows_log_changes_only() {
        let mut app = app_with("{}");
        app.chat_height = 2;
        app.chat_width = 40;

        app.session.set_draft("a question");
        app.session.begin_submit();
        app.sync_log_scroll();
        // "You:" + text + blank + "EduMate:" + "Working..." = 5 lines, 2 visible
        assert_eq!(app.chat_scroll, 3);

        app.scroll_chat_up(3);
        app.sync_log_scroll();
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn huge_answer_clamps_chat_scroll() {
        let mut app = app_with("{}");
        app.chat_height = 10;
        app.chat_width = 40;
        app.session.set_draft("q");
        app.session.begin_submit();
        app.session.complete(
            Outcome::Generated(GenerateResponse {
                explanation: Some("x\n".repeat(70_000)),
                ..Default::default()
            }),
            &OutputPolicy::default(),
        );

        app.sync_log_scroll();

        assert_eq!(app.chat_scroll, u16::MAX);
    }
}

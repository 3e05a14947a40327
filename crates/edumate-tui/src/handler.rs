use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_pending().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => app.focus_input(),

        // Tab cycles: Chat -> Output -> Input -> Chat
        KeyCode::Tab => match app.focus {
            FocusPane::Chat => app.focus = FocusPane::Output,
            FocusPane::Output | FocusPane::Input => app.focus_input(),
        },

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = half_page(app);
            scroll_focused(app, half as i32);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = half_page(app);
            scroll_focused(app, -(half as i32));
        }

        KeyCode::Char('j') | KeyCode::Down => scroll_focused(app, 1),
        KeyCode::Char('k') | KeyCode::Up => scroll_focused(app, -1),
        KeyCode::Char('g') => match app.focus {
            FocusPane::Output => app.output_scroll = 0,
            _ => app.chat_scroll = 0,
        },
        KeyCode::Char('G') => match app.focus {
            FocusPane::Output => app.scroll_output_down(u16::MAX),
            _ => app.scroll_chat_to_bottom(),
        },

        KeyCode::Char('c') => {
            if let Some(result) = app.session.result() {
                app.status = Some(if copy_to_clipboard(&result.code) {
                    "Code copied to clipboard".to_string()
                } else {
                    "No clipboard tool available".to_string()
                });
            }
        }
        KeyCode::Char('o') => {
            if let Some(url) = app.session.result().and_then(|r| r.video_url.clone()) {
                app.status = Some(if open_in_browser(&url) {
                    format!("Opening {}", url)
                } else {
                    "Could not launch a browser".to_string()
                });
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Chat;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Chat;
        }
        // Ignored while a request is in flight
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        // Ctrl/Alt chords are shortcuts, not text
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.insert_char(c)
        }
        _ => {}
    }
}

fn half_page(app: &App) -> u16 {
    let height = match app.focus {
        FocusPane::Output => app.output_height,
        _ => app.chat_height,
    };
    (height / 2).max(1)
}

fn scroll_focused(app: &mut App, delta: i32) {
    let lines = delta.unsigned_abs().min(u16::MAX as u32) as u16;
    match (app.focus, delta >= 0) {
        (FocusPane::Output, true) => app.scroll_output_down(lines),
        (FocusPane::Output, false) => app.scroll_output_up(lines),
        (_, true) => app.scroll_chat_down(lines),
        (_, false) => app.scroll_chat_up(lines),
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Position-based scrolling
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_output = app.output_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down(3);
            } else if in_output {
                app.scroll_output_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up(3);
            } else if in_output {
                app.scroll_output_up(3);
            }
        }
        _ => {}
    }
}

fn clipboard_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("pbcopy", &[])
    } else if cfg!(target_os = "windows") {
        ("clip", &[])
    } else {
        ("xclip", &["-selection", "clipboard"])
    }
}

fn copy_to_clipboard(text: &str) -> bool {
    use std::process::{Command, Stdio};
    use std::io::Write;

    let (program, args) = clipboard_command();
    match Command::new(program).args(args).stdin(Stdio::piped()).spawn() {
        Ok(mut child) => {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            child.wait().map(|s| s.success()).unwrap_or(false)
        }
        Err(e) => {
            tracing::warn!(program, error = %e, "clipboard command unavailable");
            false
        }
    }
}

fn open_in_browser(url: &str) -> bool {
    use std::process::{Command, Stdio};

    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    command
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| tracing::warn!(error = %e, "could not launch opener"))
        .is_ok()
}

// src/cli/render.rs — Terminal transcript renderer
//
// Transcript lines go to stdout; the transient typing indicator lives on
// stderr so piping stdout captures only the conversation.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use crossterm::cursor::{MoveToColumn, MoveToPreviousLine};
use crossterm::execute;
use crossterm::style::{Color, Stylize};
use crossterm::terminal::{Clear, ClearType};

use super::theme::{Palette, Theme};
use crate::core::types::{MessageEntry, TurnEvent};
use crate::core::GREETING;

const USER_LABEL: &str = "You";
const ASSISTANT_LABEL: &str = "Counselor";
const INDENT: &str = "    ";
const TYPING_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];
const TYPING_TICK: Duration = Duration::from_millis(300);

fn paint(text: &str, color: Option<Color>, bold: bool) -> String {
    match color {
        Some(c) if bold => text.with(c).bold().to_string(),
        Some(c) => text.with(c).to_string(),
        None => text.to_string(),
    }
}

/// Format one history entry. `palette` is `None` for plain output.
pub fn format_entry(entry: &MessageEntry, palette: Option<&Palette>) -> String {
    let (label, color) = if entry.is_user {
        (USER_LABEL, palette.map(|p| p.user))
    } else {
        (ASSISTANT_LABEL, palette.map(|p| p.assistant))
    };
    let dim = palette.map(|p| p.dim);

    let mut out = String::new();
    let mut lines = entry.message.lines();
    let first = lines.next().unwrap_or("");
    out.push_str(&format!("{} › {}\n", paint(label, color, true), first));
    for line in lines {
        out.push_str(&format!("{INDENT}{line}\n"));
    }

    if let Some(summary) = entry.analysis.as_ref().and_then(|a| a.summary()) {
        out.push_str(&format!("{INDENT}{}\n", paint(&format!("[{summary}]"), dim, false)));
    }

    if let Some(points) = &entry.key_points {
        for point in points {
            out.push_str(&format!("{INDENT}{} {}\n", paint("•", dim, false), point));
        }
    }

    out
}

/// Format a line that is shown but never stored (greeting, apology).
pub fn format_notice(message: &str, color: Option<Color>) -> String {
    format!("{} › {}\n", paint(ASSISTANT_LABEL, color, true), message)
}

/// Animated "Counselor is typing" line, stopped when the reply lands.
pub struct TypingIndicator {
    task: tokio::task::JoinHandle<()>,
}

impl TypingIndicator {
    /// Start animating on stderr. Returns `None` outside a tokio runtime.
    pub fn start(label: String) -> Option<Self> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval(TYPING_TICK);
            let mut frame = 0usize;
            loop {
                ticker.tick().await;
                let mut err = io::stderr();
                let _ = write!(err, "\r{label}{}", TYPING_FRAMES[frame % TYPING_FRAMES.len()]);
                let _ = err.flush();
                frame += 1;
            }
        });
        Some(Self { task })
    }

    pub fn stop(self) {
        self.task.abort();
        let _ = execute!(io::stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine));
    }
}

pub struct TerminalRenderer {
    theme: Mutex<Theme>,
    color: bool,
    /// Interactive terminal: animate typing and redraw the input line.
    interactive: bool,
    typing: Mutex<Option<TypingIndicator>>,
}

impl TerminalRenderer {
    pub fn new(theme: Theme, color: bool, interactive: bool) -> Self {
        Self {
            theme: Mutex::new(theme),
            color,
            interactive,
            typing: Mutex::new(None),
        }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_theme(&self, theme: Theme) {
        *self.theme.lock().unwrap_or_else(|e| e.into_inner()) = theme;
    }

    fn palette(&self) -> Option<Palette> {
        self.color.then(|| self.theme().palette())
    }

    fn write_out(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    /// Print one entry. Live entries first clear any typing indicator.
    pub fn render(&self, entry: &MessageEntry, historical: bool) {
        if !historical {
            self.stop_typing();
        }
        let palette = self.palette();
        self.write_out(&format_entry(entry, palette.as_ref()));
    }

    pub fn notice(&self, message: &str, is_error: bool) {
        self.stop_typing();
        let palette = self.palette();
        let color = palette.map(|p| if is_error { p.error } else { p.assistant });
        self.write_out(&format_notice(message, color));
    }

    pub fn greeting(&self) {
        self.notice(GREETING, false);
    }

    fn start_typing(&self) {
        if !self.interactive {
            return;
        }
        let mut typing = self.typing.lock().unwrap_or_else(|e| e.into_inner());
        if typing.is_none() {
            let label = paint(&format!("{ASSISTANT_LABEL} is typing"), self.palette().map(|p| p.dim), false);
            *typing = TypingIndicator::start(label);
        }
    }

    fn stop_typing(&self) {
        let indicator = self
            .typing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(indicator) = indicator {
            indicator.stop();
        }
    }

    /// Replay saved history, pausing `delay` between entries.
    pub async fn replay(&self, history: &[MessageEntry], delay: Duration) {
        if history.is_empty() {
            self.greeting();
            return;
        }
        for entry in history {
            self.render(entry, true);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Turn-event sink for `ChatSession::with_observer`.
    pub fn handle(&self, event: TurnEvent) {
        match event {
            TurnEvent::UserMessage { entry } => {
                if self.interactive {
                    // Replace the raw "> input" line with the styled bubble.
                    let _ = execute!(
                        io::stdout(),
                        MoveToPreviousLine(1),
                        Clear(ClearType::CurrentLine)
                    );
                }
                self.render(&entry, false);
            }
            TurnEvent::AwaitingReply => self.start_typing(),
            TurnEvent::Replied { user, assistant } => {
                self.stop_typing();
                if let Some(summary) = user.analysis.as_ref().and_then(|a| a.summary()) {
                    let dim = self.palette().map(|p| p.dim);
                    self.write_out(&format!("{INDENT}{}\n", paint(&format!("[{summary}]"), dim, false)));
                }
                self.render(&assistant, false);
            }
            TurnEvent::Failed { message } => self.notice(&message, true),
            TurnEvent::Cleared { greeting } => {
                if self.interactive {
                    let _ = execute!(
                        io::stdout(),
                        Clear(ClearType::All),
                        crossterm::cursor::MoveTo(0, 0)
                    );
                }
                self.notice(&greeting, false);
            }
        }
    }
}

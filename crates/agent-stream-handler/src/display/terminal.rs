use std::io::Write;

use super::{DisplayCommand, DisplaySurface, StatusState};
use crate::config::HandlerConfig;
use crate::errors::DisplayError;

/// Plain-text surface for terminals and log files.
///
/// The response placeholder is rendered incrementally: only the part of the
/// new markdown that differs from what is already on screen is written, and a
/// trailing cursor left on the current line is erased with backspaces.
///
/// Any other command ends the response line. The cursor is erased first, and
/// the next response update is written in full on a fresh line, so the last
/// response update always ends up below the status output.
pub struct TerminalSurface<W: Write> {
    out: W,
    cursor: String,
    shown: String,
    response_line_open: bool,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            cursor: HandlerConfig::default().cursor,
            shown: String::new(),
            response_line_open: false,
        }
    }

    /// Cursor appended by the handler to in-progress responses. Must match
    /// `HandlerConfig::cursor` for the cursor to be erased when the line ends.
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_response_line(&mut self) -> std::io::Result<()> {
        if !self.response_line_open {
            return Ok(());
        }
        if !self.cursor.is_empty() && self.shown.ends_with(&self.cursor) {
            for _ in 0..self.cursor.chars().count() {
                write!(self.out, "\u{8} \u{8}")?;
            }
        }
        writeln!(self.out)?;
        self.shown.clear();
        self.response_line_open = false;
        Ok(())
    }

    fn render_response(&mut self, markdown: &str) -> std::io::Result<()> {
        let common = common_prefix_len(&self.shown, markdown);
        if self.response_line_open {
            let stale = self.shown[common..].chars().count();
            for _ in 0..stale {
                write!(self.out, "\u{8} \u{8}")?;
            }
        }
        write!(self.out, "{}", &markdown[common..])?;
        self.shown = markdown.to_string();
        self.response_line_open = true;
        Ok(())
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn render(&mut self, command: DisplayCommand) -> Result<(), DisplayError> {
        if let DisplayCommand::ResponseMarkdown { markdown } = &command {
            self.render_response(markdown)?;
            self.out.flush()?;
            return Ok(());
        }

        self.close_response_line()?;
        match command {
            DisplayCommand::OpenStatus { label, .. } => {
                writeln!(self.out, "[{label}]")?;
            }
            DisplayCommand::OpenPlaceholder => {
                self.shown.clear();
            }
            DisplayCommand::UpdateStatus { label, state, .. } => {
                let marker = match state {
                    StatusState::Running => "..",
                    StatusState::Complete => "ok",
                    StatusState::Error => "!!",
                };
                writeln!(self.out, "[{label}] ({marker})")?;
            }
            DisplayCommand::StatusLine { markdown } => {
                writeln!(self.out, "  {markdown}")?;
            }
            DisplayCommand::StatusError { text } => {
                writeln!(self.out, "  error: {text}")?;
            }
            DisplayCommand::DetailPanel { title, block, .. } => {
                writeln!(self.out, "  > {title}")?;
                writeln!(self.out, "    ```{}", block.language)?;
                for line in block.code.lines() {
                    writeln!(self.out, "    {line}")?;
                }
                writeln!(self.out, "    ```")?;
            }
            DisplayCommand::ResponseMarkdown { .. } => {}
        }
        self.out.flush()?;
        Ok(())
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| a.len().min(b.len()))
}

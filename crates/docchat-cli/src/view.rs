use std::cell::RefCell;
use std::io::{self, Write};

use colored::Colorize;
use docchat_client::render::html_to_text;
use docchat_client::types::Role;
use docchat_client::ChatView;

/// Prints the conversation as plain text
///
/// A terminal cannot rewrite a line once scrolled, so a pending reply is
/// shown as a dim marker and the answer is printed after it.
pub struct TerminalView<W: Write> {
    out: RefCell<W>,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out: RefCell::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn print(&self, line: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            log::warn!("Failed to write to terminal: {}", e);
        }
    }

    fn print_message(&self, role: Role, html: &str) {
        let text = html_to_text(html);
        match role {
            Role::Outgoing => self.print(&format!("{} {}", "You:".bright_green().bold(), text)),
            Role::Incoming => self.print(&format!("{} {}", "Assistant:".bright_cyan().bold(), text)),
        }
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    type Entry = ();

    fn show_message(&self, role: Role, html: &str) {
        self.print_message(role, html);
    }

    fn update_message(&self, _entry: &(), html: &str) {
        self.print_message(Role::Incoming, html);
    }

    fn reset(&self) {
        self.print(&"─".repeat(40).bright_black().to_string());
    }

    // The line editor already consumed the input
    fn clear_input(&self) {}

    fn set_input_enabled(&self, _enabled: bool) {}
}

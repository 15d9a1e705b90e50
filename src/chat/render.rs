//! Output rendering for the chat application.
//!
//! The session produces markup (`<b>`, `</b>`, `<br/>` and escaped
//! entities).  [`MarkupPrinter`] converts that markup into terminal text and
//! the [`Renderer`] trait decides where it goes.

use std::io::{self, Stdout, Write};

use crate::markup::{BOLD_CLOSE, BOLD_OPEN, LINE_BREAK};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for status lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the speaker label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Converts markup pieces into terminal text.
///
/// Bold state carries over between pieces because a bold run may be split
/// across several revealed tokens.
#[derive(Debug, Clone, Default)]
pub struct MarkupPrinter {
    use_color: bool,
    in_bold: bool,
}

impl MarkupPrinter {
    /// Creates a printer; without color, bold tags are dropped.
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            in_bold: false,
        }
    }

    /// Converts one piece of markup.
    pub fn convert(&mut self, markup: &str) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut rest = markup;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix(BOLD_OPEN) {
                self.in_bold = true;
                if self.use_color {
                    out.push_str(ANSI_BOLD);
                }
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix(BOLD_CLOSE) {
                self.in_bold = false;
                if self.use_color {
                    out.push_str(ANSI_RESET);
                }
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix(LINE_BREAK) {
                out.push('\n');
                rest = tail;
            } else if let Some((entity, text)) = ENTITIES
                .iter()
                .find(|(entity, _)| rest.starts_with(entity))
            {
                out.push_str(text);
                rest = &rest[entity.len()..];
            } else {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }
        out
    }

    /// Closes an open bold run, returning the text that does so.
    pub fn finish(&mut self) -> &'static str {
        let was_bold = std::mem::replace(&mut self.in_bold, false);
        if was_bold && self.use_color {
            ANSI_RESET
        } else {
            ""
        }
    }
}

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Called when the answer to a prompt is about to be shown.
    fn start_response(&mut self);

    /// Print a piece of revealed markup.
    ///
    /// This is called once per revealed token.
    fn print_markup(&mut self, markup: &str);

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after the reveal.
    fn finish_response(&mut self);

    /// Print a waiting indicator while the model is called.
    fn print_loading(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the user abandons a turn.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    printer: MarkupPrinter,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            printer: MarkupPrinter::new(use_color),
        }
    }

    /// Flushes stdout to ensure immediate display of revealed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn reset_styles(&mut self) {
        let reset = self.printer.finish();
        if !reset.is_empty() {
            print!("{reset}");
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        // Clear the loading line.
        if self.use_color {
            print!("\r\x1b[2K{ANSI_CYAN}Gemini:{ANSI_RESET} ");
        } else {
            print!("Gemini: ");
        }
        self.flush();
    }

    fn print_markup(&mut self, markup: &str) {
        let text = self.printer.convert(markup);
        print!("{text}");
        self.flush();
    }

    fn finish_response(&mut self) {
        self.reset_styles();
        println!();
        self.flush();
    }

    fn print_loading(&mut self) {
        if self.use_color {
            print!("{ANSI_DIM}thinking...{ANSI_RESET}");
        } else {
            println!("thinking...");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.reset_styles();
        if self.use_color {
            eprintln!("\n{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("\nError: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.reset_styles();
        println!("{info}");
    }

    fn print_interrupted(&mut self) {
        self.reset_styles();
        println!("\n[interrupted]");
        self.flush();
    }
}

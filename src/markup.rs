//! Conversion of model text into the restricted markup the chat displays.
//!
//! The model answers in a markdown dialect.  Only two constructs are
//! recognized: `**` toggles bold and a lone `*` becomes a line break.
//! Everything else passes through untouched, so callers that cannot trust
//! the model's output should go through [`render_markup`] with
//! [`MarkupPolicy::Escaped`].

/// Opening bold tag.
pub const BOLD_OPEN: &str = "<b>";

/// Closing bold tag.
pub const BOLD_CLOSE: &str = "</b>";

/// Line-break tag.
pub const LINE_BREAK: &str = "<br/>";

/// How raw model text is treated before transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkupPolicy {
    /// HTML-significant characters are escaped first.
    #[default]
    Escaped,

    /// Raw text is inserted as markup verbatim.
    Trusted,
}

/// Converts markdown-flavoured text into markup.
///
/// Segments between `**` delimiters alternate literal/bold by position, so
/// an unpaired delimiter bolds everything after it.  Remaining `*` become
/// `<br/>`.
///
/// ```
/// # use chatbox::markup::transform;
/// assert_eq!(transform("a**b**c"), "a<b>b</b>c");
/// assert_eq!(transform("x**y"), "x<b>y</b>");
/// assert_eq!(transform("a*b*c"), "a<br/>b<br/>c");
/// ```
pub fn transform(raw: &str) -> String {
    let mut bolded = String::with_capacity(raw.len());
    for (index, segment) in raw.split("**").enumerate() {
        if index % 2 == 0 {
            bolded.push_str(segment);
        } else {
            bolded.push_str(BOLD_OPEN);
            bolded.push_str(segment);
            bolded.push_str(BOLD_CLOSE);
        }
    }
    bolded.replace('*', LINE_BREAK)
}

/// Escapes the characters that are significant in HTML.
///
/// `*` is left alone so the escaped text can still be transformed.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Transforms `raw` according to `policy`.
pub fn render_markup(raw: &str, policy: MarkupPolicy) -> String {
    match policy {
        MarkupPolicy::Escaped => transform(&escape_html(raw)),
        MarkupPolicy::Trusted => transform(raw),
    }
}

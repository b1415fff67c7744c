//! Track list page
//!
//! The page is rendered once at startup since the library never changes.
//! Each entry carries its base64 file identifier in `data-file`; the script
//! posts it back verbatim when the entry is clicked.

use super::payload::encode_file_id;
use crate::library::LibraryIndex;

const PAGE_TEMPLATE: &str = include_str!("page.html");

/// Separator between list entries
const ENTRY_SEPARATOR: &str = "\n<hr />\n";

/// Render the full HTML page for `library`
pub fn render_page(library: &LibraryIndex) -> String {
    let entries = library
        .iter()
        .map(|track| {
            format!(
                r#"<div class="track" data-file="{}">{}</div>"#,
                encode_file_id(&track.short_path),
                escape_html(&track.short_path)
            )
        })
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR);

    PAGE_TEMPLATE.replace("{{TRACKS}}", &entries)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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

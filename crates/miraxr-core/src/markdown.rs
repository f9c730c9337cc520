//! Markdown to HTML compilation for EULA bodies.

use pulldown_cmark::{Options, Parser, html};

/// Compile a Markdown document to HTML.
///
/// CommonMark plus the GitHub extensions legal text tends to use: tables,
/// strikethrough, task lists and footnotes. Raw HTML in the source is passed
/// through unchanged.
#[must_use]
pub fn to_html(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

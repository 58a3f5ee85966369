//! System prompts for page-image-to-Markdown conversion.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tweaking the conversion instruction
//!    requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompts directly without
//!    spinning up a real model, so prompt regressions are easy to catch.

/// System prompt for converting a PDF page image to Markdown.
///
/// Sent as the first message of every completion request.
pub const SYSTEM_PROMPT: &str = "\
Convert the following PDF page to markdown.
Return only the markdown with no explanation text.
Do not exclude any content from the page.";

/// Build the format-continuity context message for maintain-format mode.
///
/// The previous page's Markdown is embedded verbatim, triple-quoted, as a
/// second system message so the model keeps numbering, heading levels, and
/// running text consistent across sequential pages.
pub fn maintain_format_context(prior_page: &str) -> String {
    format!(
        "Markdown must maintain consistent formatting with the following page:\n\n\"\"\"{prior_page}\"\"\""
    )
}

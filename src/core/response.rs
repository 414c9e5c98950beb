//! Discord message limits and UTF-8 safe truncation
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Component limits (rows, buttons per row, labels, custom ids)
//! - 1.0.0: Content and embed truncation

/// Discord embed description limit
pub const EMBED_LIMIT: usize = 4096;
/// Discord embed title limit
pub const EMBED_TITLE_LIMIT: usize = 256;
/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Button and select option label limit
pub const LABEL_LIMIT: usize = 80;
/// Action rows per message
pub const MAX_ROWS: usize = 5;
/// Buttons per action row
pub const MAX_ROW_COMPONENTS: usize = 5;
/// Modal title limit
pub const MODAL_TITLE_LIMIT: usize = 45;
/// Modal text input value limit
pub const INPUT_VALUE_LIMIT: usize = 4000;

/// Truncate to at most `limit` bytes, ending with an ellipsis when cut.
///
/// Never splits a UTF-8 character.
pub fn truncate_to(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let ellipsis = "…";
    let mut end = limit.saturating_sub(ellipsis.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{ellipsis}", &text[..end])
}

/// Truncate text to fit the embed description limit
pub fn truncate_for_embed(text: &str) -> String {
    truncate_to(text, EMBED_LIMIT)
}

/// Truncate text to fit the message content limit
pub fn truncate_for_message(text: &str) -> String {
    truncate_to(text, MESSAGE_LIMIT)
}

/// Truncate a button or option label
pub fn truncate_label(text: &str) -> String {
    truncate_to(text, LABEL_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_to("hello", 100), "hello");
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let result = truncate_for_message(&"a".repeat(2500));
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with('…'));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "⇒".repeat(40);
        let result = truncate_label(&text);
        assert!(result.len() <= LABEL_LIMIT);
        assert!(result.chars().all(|c| c == '⇒' || c == '…'));
    }

    #[test]
    fn test_embed_limit() {
        let result = truncate_for_embed(&"b".repeat(5000));
        assert!(result.len() <= EMBED_LIMIT);
    }
}

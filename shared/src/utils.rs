//! Text helpers used when deriving summaries and quotes from complaints.

/// First `max` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shortened text with a trailing ellipsis when `text` exceeds `max` chars.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}…", truncate_chars(text, max).trim())
    } else {
        text.trim().to_string()
    }
}

/// Text up to the first period, without it.
pub fn first_sentence(text: &str) -> &str {
    text.split('.').next().unwrap_or(text)
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Joins the lines of `text` with single spaces and trims the result.
pub fn collapse_newlines(text: &str) -> String {
    text.lines()
        .map(|line| line.replace('\r', " "))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Cut `text` to at most `max_chars` characters, appending `ellipsis` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize, ellipsis: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ellipsis),
        None => text.to_string(),
    }
}

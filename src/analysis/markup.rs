/// Remove `<...>` markup tags from alert text.
///
/// A `<` with no closing `>` swallows the rest of the text, the same way the
/// console's list renderer treats a truncated tag.
pub fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match (in_tag, ch) {
            (false, '<') => in_tag = true,
            (false, c) => out.push(c),
            (true, '>') => in_tag = false,
            (true, _) => {}
        }
    }
    out
}

//! Query canonicalization applied before embedding.

/// Trim, lower-case and collapse whitespace runs to a single space.
///
/// Characters whose lower-case form expands to several characters are kept
/// as they are, so the result is never longer than the input.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars() {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => out.push(l),
                _ => out.push(c),
            }
        }
    }

    out
}

//! Listing previews: the first paragraph line of a post, cut to a display-safe length.

/// Shown when a post has no usable line or cannot be read.
pub const UNAVAILABLE: &str = "Preview not available.";

const MAX_CHARS: usize = 200;
/// A word break is only taken if it keeps at least this many characters.
const MIN_BREAK: usize = 150;
const ELLIPSIS: &str = "...";

/// Picks the first line that is not blank, a `#` heading or a `![` image,
/// and truncates it.
pub fn extract(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("!["))
        .map(truncate)
        .unwrap_or_else(|| UNAVAILABLE.to_owned())
}

/// Lines of up to 200 characters pass through. Longer lines are cut at 200,
/// pulled back to the last space if that space sits at character 150 or
/// later, and marked with an ellipsis.
pub fn truncate(line: &str) -> String {
    let Some((cut, _)) = line.char_indices().nth(MAX_CHARS) else {
        return line.to_owned();
    };
    let head = &line[..cut];

    let end = head.char_indices()
        .enumerate()
        .filter(|(_, (_, c))| *c == ' ')
        .last()
        .filter(|(chars, _)| *chars >= MIN_BREAK)
        .map_or(cut, |(_, (byte, _))| byte);

    format!("{}{ELLIPSIS}", &line[..end])
}

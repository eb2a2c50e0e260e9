/// Cuts the next physical line off `content` for a column `width` code points
/// wide.
///
/// Returns the cell as printed (the line left-aligned, padded to `width`, with
/// one space of padding on each side) and whatever is left of `content`.
///
/// A line ends at an embedded `\n`, which is consumed, or once `width` code
/// points have been taken. A hard wrap that falls right before a `\n` consumes
/// that newline as well, so a line exactly `width` long does not leave an empty
/// line behind it. At least one code point is taken per call, so repeated calls
/// always make progress.
pub fn next_line(content: &str, width: usize) -> (String, &str) {
    let limit = width.max(1);
    let mut line = String::new();
    let mut taken = 0;
    let mut rest = "";

    for (i, ch) in content.char_indices() {
        if ch == '\n' {
            rest = &content[i + ch.len_utf8()..];
            break;
        }
        if taken == limit {
            rest = &content[i..];
            break;
        }
        line.push(ch);
        taken += 1;
    }

    (format!(" {line:<width$} "), rest)
}

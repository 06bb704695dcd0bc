use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width in terminal columns (CJK and emoji count as 2).
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Remove control characters and ANSI escape sequences from server text.
///
/// Newlines and tabs survive; tabs become a single space. Borrowed when
/// there is nothing to strip.
pub fn sanitize(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_control() && c != '\n') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                // CSI: ESC [ params final(0x40..=0x7e)
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: ESC ] ... BEL | ESC \
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Truncate to `max_width` columns, appending "..." when something was cut.
///
/// Widths of 3 or less cut without an ellipsis.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width <= ELLIPSIS_WIDTH {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }
    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

/// Greedy word wrap into lines of at most `width` columns.
///
/// Existing newlines are kept. Words longer than a line are split.
/// At most `max_lines` lines are returned; the last one is truncated with
/// an ellipsis when text remains.
pub fn wrap_to_width(s: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut overflow = false;

    let paragraphs: Vec<&str> = s.split('\n').collect();
    'paragraphs: for (index, paragraph) in paragraphs.iter().enumerate() {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word;
            loop {
                let word_width = display_width(word);
                let gap = usize::from(line_width > 0);
                if line_width + gap + word_width <= width {
                    if gap == 1 {
                        line.push(' ');
                    }
                    line.push_str(word);
                    line_width += gap + word_width;
                    break;
                }
                if line_width > 0 {
                    if lines.len() + 1 >= max_lines {
                        overflow = true;
                        lines.push(std::mem::take(&mut line));
                        break 'paragraphs;
                    }
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                    continue;
                }
                // Word alone is wider than the line: hard split
                let split = split_at_width(word, width);
                line.push_str(&word[..split]);
                word = &word[split..];
                if lines.len() + 1 >= max_lines {
                    overflow = true;
                    lines.push(std::mem::take(&mut line));
                    break 'paragraphs;
                }
                lines.push(std::mem::take(&mut line));
                if word.is_empty() {
                    break;
                }
            }
        }

        if lines.len() >= max_lines {
            overflow = !line.is_empty()
                || paragraphs[index + 1..].iter().any(|p| !p.trim().is_empty());
            break;
        }
        lines.push(line);
    }

    // Drop trailing blank lines from trailing newlines
    while lines.last().is_some_and(|l| l.is_empty()) && !overflow {
        lines.pop();
    }

    if overflow && width > ELLIPSIS_WIDTH {
        if let Some(last) = lines.last_mut() {
            let shortened = truncate_to_width(last, width.saturating_sub(ELLIPSIS_WIDTH)).into_owned();
            *last = format!("{}{}", shortened.trim_end_matches(ELLIPSIS), ELLIPSIS);
        }
    }
    lines
}

/// Byte index of the longest prefix of `s` that fits in `width` columns
/// (at least one character, so wrapping always makes progress).
fn split_at_width(s: &str, width: usize) -> usize {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width && idx > 0 {
            return idx;
        }
        used += w;
    }
    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_clean_text_is_borrowed() {
        assert!(matches!(sanitize("hello\nworld"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_sanitize_strips_escapes() {
        assert_eq!(sanitize("a\x1b[31mred\x1b[0m b"), "ared b");
        assert_eq!(sanitize("x\x1b]0;title\x07y"), "xy");
        assert_eq!(sanitize("tab\there\x00"), "tab here");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Test", 2), "Te");
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
    }

    #[test]
    fn test_wrap_basic() {
        assert_eq!(
            wrap_to_width("the quick brown fox jumps", 10, 5),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_keeps_newlines() {
        assert_eq!(wrap_to_width("one\ntwo", 10, 5), vec!["one", "two"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap_to_width("abcdefghij", 4, 5), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_truncates_with_ellipsis() {
        let lines = wrap_to_width("aa bb cc dd ee ff", 5, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "aa bb");
        assert!(lines[1].ends_with("..."));
        assert!(display_width(&lines[1]) <= 5);
    }

    #[test]
    fn test_wrap_degenerate() {
        assert!(wrap_to_width("text", 0, 3).is_empty());
        assert!(wrap_to_width("", 10, 3).is_empty());
    }
}

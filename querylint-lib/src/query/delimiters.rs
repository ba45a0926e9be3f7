/// Find the parenthesis that closes the one at byte offset `open`.
///
/// Returns the offset one past the matching `)`, or `None` when the text ends before the
/// depth returns to zero. Unbalanced input is not an error, just a non-match.
///
/// Each call walks the text from `open`. Code that needs many lookups over the same text
/// should build a [`Delimiters`] index once instead.
#[must_use]
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    for (offset, &b) in bytes[open..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Delimiter positions of one text, computed up front.
///
/// Parentheses are paired with a stack and the next `}` after every offset is recorded,
/// both in a single pass. Lookups are then constant time, so scanners that probe every
/// `default_zero(` or every `{` stay linear even when none of them is closed.
#[derive(Debug)]
pub struct Delimiters {
    /// For each `(`, the offset one past its matching `)`.
    paren_end: Vec<Option<usize>>,

    /// For each offset, the first `}` at or after it.
    next_close_brace: Vec<Option<usize>>,
}

impl Delimiters {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();

        let mut paren_end = vec![None; bytes.len()];
        let mut open = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => open.push(i),
                b')' => {
                    if let Some(start) = open.pop() {
                        paren_end[start] = Some(i + 1);
                    }
                }
                _ => {}
            }
        }

        let mut next_close_brace = vec![None; bytes.len()];
        let mut next = None;
        for (i, &b) in bytes.iter().enumerate().rev() {
            if b == b'}' {
                next = Some(i);
            }
            next_close_brace[i] = next;
        }

        Self {
            paren_end,
            next_close_brace,
        }
    }

    /// Same answer as [`find_matching_paren`] for the indexed text.
    #[must_use]
    pub fn matching_paren(&self, open: usize) -> Option<usize> {
        self.paren_end.get(open).copied().flatten()
    }

    /// Offset of the first `}` at or after `from`.
    #[must_use]
    pub fn next_close_brace(&self, from: usize) -> Option<usize> {
        self.next_close_brace.get(from).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pair() {
        assert_eq!(find_matching_paren("f(x)", 1), Some(4));
    }

    #[test]
    fn test_nested_pairs() {
        let text = "a(b(c)d(e))f";
        assert_eq!(find_matching_paren(text, 1), Some(11));
        assert_eq!(find_matching_paren(text, 3), Some(6));
        assert_eq!(find_matching_paren(text, 7), Some(10));
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(find_matching_paren("f((x)", 1), None);
        assert_eq!(find_matching_paren("(", 0), None);
    }

    #[test]
    fn test_not_an_open_paren() {
        assert_eq!(find_matching_paren("f(x)", 0), None);
        assert_eq!(find_matching_paren("f(x)", 3), None);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(find_matching_paren("()", 10), None);
        assert_eq!(find_matching_paren("", 0), None);
    }

    #[test]
    fn test_braces_do_not_count() {
        assert_eq!(find_matching_paren("({x})", 0), Some(5));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "(é(ü))";
        assert_eq!(find_matching_paren(text, 0), Some(text.len()));
    }

    #[test]
    fn test_index_agrees_with_depth_counter() {
        for text in ["a(b(c)d(e))f", "f((x)", ")(()", "((()", "x)(y))(", "(é(ü))", ""] {
            let index = Delimiters::new(text);
            for open in 0..=text.len() {
                assert_eq!(index.matching_paren(open), find_matching_paren(text, open), "{text:?} at {open}");
            }
        }
    }

    #[test]
    fn test_next_close_brace() {
        let index = Delimiters::new("a{b}c{d");
        assert_eq!(index.next_close_brace(0), Some(3));
        assert_eq!(index.next_close_brace(3), Some(3));
        assert_eq!(index.next_close_brace(4), None);
        assert_eq!(index.next_close_brace(100), None);
    }

    #[test]
    fn test_empty_text() {
        let index = Delimiters::new("");
        assert_eq!(index.matching_paren(0), None);
        assert_eq!(index.next_close_brace(0), None);
    }
}

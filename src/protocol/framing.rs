use std::ops::Range;

pub const PREFIX: &str = "[[BD:";
pub const SUFFIX: &str = ":BD]]";

/// One delimited span: the raw body between the markers and the byte range
/// of the whole span (markers included) in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub body: &'a str,
    pub range: Range<usize>,
}

pub fn contains_prefix(text: &str) -> bool {
    text.contains(PREFIX)
}

/// Every `PREFIX … SUFFIX` span in `text`, shortest match first, so adjacent
/// spans in one block stay separate even when bodies contain colons and
/// brackets. An unterminated prefix ends the scan.
pub fn find_spans(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find(PREFIX) {
        let start = cursor + offset;
        let body_start = start + PREFIX.len();
        let Some(body_len) = text[body_start..].find(SUFFIX) else {
            break;
        };
        let body_end = body_start + body_len;
        let end = body_end + SUFFIX.len();
        spans.push(Span {
            body: &text[body_start..body_end],
            range: start..end,
        });
        cursor = end;
    }
    spans
}

/// `text` with every span removed, plus how many spans were removed.
///
/// Runs to a fixpoint: removing one span can join the text on either side
/// into a new span, which is removed as well.
pub fn strip_spans(text: &str) -> (String, usize) {
    let mut current = text.to_string();
    let mut removed = 0;
    loop {
        let spans = find_spans(&current);
        if spans.is_empty() {
            return (current, removed);
        }
        let mut out = String::with_capacity(current.len());
        let mut last = 0;
        for span in &spans {
            out.push_str(&current[last..span.range.start]);
            last = span.range.end;
        }
        out.push_str(&current[last..]);
        removed += spans.len();
        current = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_markers_means_nothing_to_do() {
        assert!(find_spans("plain story text").is_empty());
        assert_eq!(strip_spans("plain").1, 0);
    }

    #[test]
    fn adjacent_spans_are_separated() {
        let text = r#"[[BD:{"type":"ping"}:BD]][[BD:{"type":"clearAll"}:BD]]"#;
        let spans = find_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].body, r#"{"type":"ping"}"#);
        assert_eq!(spans[1].body, r#"{"type":"clearAll"}"#);
    }

    #[test]
    fn body_may_contain_colons_and_brackets() {
        let text = r#"a [[BD:{"k":"x:y","arr":[[1],[2]]}:BD]] b"#;
        let spans = find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].body, r#"{"k":"x:y","arr":[[1],[2]]}"#);
        assert_eq!(&text[spans[0].range.clone()], r#"[[BD:{"k":"x:y","arr":[[1],[2]]}:BD]]"#);
    }

    #[test]
    fn strip_removes_spans_even_with_invalid_bodies() {
        let text = "Some story. [[BD:not json:BD]] More [[BD:{}:BD]]story.";
        let (stripped, count) = strip_spans(text);
        assert_eq!(count, 2);
        assert_eq!(stripped, "Some story.  More story.");
        assert!(!stripped.contains(PREFIX));
    }

    #[test]
    fn unterminated_prefix_is_left_alone() {
        let text = "x [[BD:{\"type\":\"ping\"} never closed";
        assert!(find_spans(text).is_empty());
        assert_eq!(strip_spans(text).0, text);
    }

    #[test]
    fn spans_joined_by_removal_are_removed_too() {
        let text = "[[B[[BD:{}:BD]]D:{}:BD]] tail";
        let (stripped, count) = strip_spans(text);
        assert_eq!(stripped, " tail");
        assert_eq!(count, 2);
    }

    #[test]
    fn multibyte_text_around_spans() {
        let text = "caf\u{e9} [[BD:{}:BD]] na\u{ef}ve";
        assert_eq!(strip_spans(text).0, "caf\u{e9}  na\u{ef}ve");
    }
}

/// Value part of an annotation line as it appears in the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueText<'a> {
    /// `@Name` with nothing after it.
    Presence,
    /// Text after the first space, trimmed. May be empty.
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationLine<'a> {
    /// Annotation name including the leading `@`.
    pub name: &'a str,
    pub value: ValueText<'a>,
}

const MARKER: char = '@';

fn is_decoration(c: char) -> bool {
    matches!(c, '\t' | '\n' | ' ' | '*' | '/')
}

/// Split a raw doc comment into annotation lines, in source order.
///
/// Comment decoration (`/**`, leading `*`, `*/`) is stripped from both ends of
/// every line. Lines that do not start with `@` afterwards are ignored, and
/// repeated names are kept as separate entries.
pub fn scan(raw: &str) -> Vec<AnnotationLine<'_>> {
    raw.lines().filter_map(scan_line).collect()
}

fn scan_line(line: &str) -> Option<AnnotationLine<'_>> {
    let line = line.trim_matches(is_decoration);
    if !line.starts_with(MARKER) {
        return None;
    }

    let annotation = match line.split_once(' ') {
        Some((name, rest)) => AnnotationLine {
            name,
            value: ValueText::Text(rest.trim()),
        },
        None => AnnotationLine {
            name: line,
            value: ValueText::Presence,
        },
    };
    Some(annotation)
}

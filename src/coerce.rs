use serde_json::Value;

use crate::scanner::ValueText;
use crate::value::AnnotationValue;

/// Turn the value text of one annotation line into a typed value.
///
/// Rules are tried in order and the first one that applies wins:
///
/// 1. no value text at all is a presence flag, `true`
/// 2. `null` in any letter case is `Null`
/// 3. a single JSON literal (number, quoted string, boolean, array, object)
/// 4. a comma separated list, decoded as if it were wrapped in `[...]`;
///    bare words in the list are accepted as strings
/// 5. the raw text as a string
///
/// Nothing here fails: text that is not a literal ends up in rule 5.
pub fn coerce(value: ValueText<'_>) -> AnnotationValue {
    let text = match value {
        ValueText::Presence => return AnnotationValue::Bool(true),
        ValueText::Text(text) => text,
    };

    if text.eq_ignore_ascii_case("null") {
        return AnnotationValue::Null;
    }

    if let Some(value) = decode_literal(text) {
        return value;
    }

    if let Some(items) = decode_list(text) {
        return AnnotationValue::List(items);
    }

    AnnotationValue::String(text.to_string())
}

fn decode_literal(text: &str) -> Option<AnnotationValue> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value.into()),
    }
}

fn decode_list(text: &str) -> Option<Vec<AnnotationValue>> {
    match serde_json::from_str::<Value>(&format!("[{text}]")) {
        Ok(Value::Array(items)) => Some(items.into_iter().map(AnnotationValue::from).collect()),
        _ => decode_bare_list(text),
    }
}

/// `dog, cat, "hamster"` style lists where some items are unquoted words.
fn decode_bare_list(text: &str) -> Option<Vec<AnnotationValue>> {
    let items = split_top_level(text)?;
    // a lone bare word stays a plain string (rule 5)
    if items.len() < 2 {
        return None;
    }

    items
        .into_iter()
        .map(|item| {
            let item = item.trim();
            if let Ok(value) = serde_json::from_str::<Value>(item) {
                Some(AnnotationValue::from(value))
            } else if is_bare_word(item) {
                Some(AnnotationValue::String(item.to_string()))
            } else {
                None
            }
        })
        .collect()
}

/// Split on commas that sit outside quotes and brackets.
///
/// Returns `None` for unbalanced brackets or an unterminated string.
fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_string || depth != 0 {
        return None;
    }
    items.push(&text[start..]);
    Some(items)
}

fn is_bare_word(item: &str) -> bool {
    !item.is_empty()
        && !item
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '{' | '}' | '"' | ':' | ','))
}

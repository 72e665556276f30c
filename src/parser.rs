use std::borrow::Cow;
use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::coerce::coerce;
use crate::scanner::scan;
use crate::value::AnnotationValue;

/// All annotations found in one doc comment.
///
/// Names keep the order of their first appearance; the values of a name keep
/// the order of its lines. A name that never appeared is absent, never mapped
/// to an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    entries: Vec<(String, Vec<AnnotationValue>)>,
    index: HashMap<String, usize>,
}

impl Annotations {
    fn push(&mut self, name: &str, value: AnnotationValue) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1.push(value),
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), vec![value]));
            }
        }
    }

    /// First value recorded for `name`. The `@` prefix is optional.
    pub fn first(&self, name: &str) -> Option<&AnnotationValue> {
        self.all(name).first()
    }

    /// Every value recorded for `name`, empty when absent.
    pub fn all(&self, name: &str) -> &[AnnotationValue] {
        let name = normalize_name(name);
        match self.index.get(name.as_ref()) {
            Some(&i) => &self.entries[i].1,
            None => &[],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(normalize_name(name).as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AnnotationValue])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Annotations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Prefix `@` unless the caller already did.
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    if name.starts_with('@') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("@{name}"))
    }
}

/// Parse every annotation of a raw doc comment.
pub fn parse(raw: &str) -> Annotations {
    let mut annotations = Annotations::default();
    for line in scan(raw) {
        annotations.push(line.name, coerce(line.value));
    }
    annotations
}

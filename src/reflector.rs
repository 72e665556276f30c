use std::borrow::Cow;

use crate::error::{Error, Result};

/// Handle to a program element whose doc comment can be inspected.
///
/// `identity` must be stable and unique per element: it is the memoization
/// key of [`AnnotationCache`](crate::cache::AnnotationCache).
pub trait Reflector {
    fn identity(&self) -> Cow<'_, str>;

    /// Short label of the element type, used in error reports.
    fn kind(&self) -> &'static str;

    /// Verbatim doc comment text, decoration included, or `""` when the
    /// element has none.
    ///
    /// Element types that cannot carry doc comments keep this default and
    /// fail with [`Error::UnsupportedReflector`].
    fn doc_comment(&self) -> Result<Cow<'_, str>> {
        Err(Error::UnsupportedReflector {
            kind: self.kind(),
            identity: self.identity().into_owned(),
        })
    }
}

/// A doc comment not tied to parsed source, e.g. read from stdin.
#[derive(Debug, Clone)]
pub struct DocBlock {
    identity: String,
    text: String,
}

impl DocBlock {
    pub fn new(identity: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            text: text.into(),
        }
    }
}

impl Reflector for DocBlock {
    fn identity(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.identity)
    }

    fn kind(&self) -> &'static str {
        "doc block"
    }

    fn doc_comment(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(&self.text))
    }
}

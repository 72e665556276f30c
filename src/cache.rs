use dashmap::DashMap;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::parser::{parse, Annotations};
use crate::reflector::Reflector;
use crate::value::AnnotationValue;

/// Memoized parse result of one element's doc comment
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Fingerprint of the comment text the entry was parsed from
    content_hash: u64,
    annotations: Arc<Annotations>,
}

/// Per-element annotation cache.
///
/// Entries are keyed by [`Reflector::identity`], so two elements never share
/// an entry even when their comments are identical. The first lookup for an
/// element parses its whole doc comment; later lookups for any name reuse
/// it. The map is safe to share between threads; two threads missing on the
/// same element at once both parse, and the last insert wins with an
/// identical result.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    memory_cache: DashMap<String, CacheEntry>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate hash for comment content
    fn hash_content(content: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish()
    }

    fn load<R: Reflector + ?Sized>(&self, element: &R) -> Result<Arc<Annotations>> {
        let identity = element.identity();
        let comment = element.doc_comment()?;
        let content_hash = Self::hash_content(&comment);

        if let Some(entry) = self.memory_cache.get(identity.as_ref()) {
            if entry.content_hash == content_hash {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.annotations));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let annotations = Arc::new(parse(&comment));
        debug!(
            element = %identity,
            annotations = annotations.len(),
            "parsed doc comment"
        );
        self.memory_cache.insert(
            identity.into_owned(),
            CacheEntry {
                content_hash,
                annotations: Arc::clone(&annotations),
            },
        );
        Ok(annotations)
    }

    /// First value of annotation `name` on `element`, `None` when the
    /// annotation is not present. The `@` prefix of `name` is optional.
    pub fn get<R: Reflector + ?Sized>(
        &self,
        element: &R,
        name: &str,
    ) -> Result<Option<AnnotationValue>> {
        Ok(self.load(element)?.first(name).cloned())
    }

    /// Every value of annotation `name` on `element`, in source order.
    pub fn get_all<R: Reflector + ?Sized>(
        &self,
        element: &R,
        name: &str,
    ) -> Result<Vec<AnnotationValue>> {
        Ok(self.load(element)?.all(name).to_vec())
    }

    /// Copy of every annotation on `element`.
    pub fn annotations<R: Reflector + ?Sized>(&self, element: &R) -> Result<Annotations> {
        Ok(Annotations::clone(&*self.load(element)?))
    }

    /// Drop every memoized entry
    pub fn clear(&self) {
        self.memory_cache.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory_cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub hits: usize,
    pub misses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::reflector::DocBlock;
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;

    const MOCK: &str = "/**\n * @MultipleAnnotation 1\n * @MultipleAnnotation 2\n * @SingleAnnotation\n * @False false\n */";

    #[test]
    fn test_cache_hit_miss() {
        let cache = AnnotationCache::new();
        let element = DocBlock::new("Mock", MOCK);

        // First access - cache miss
        assert_eq!(
            cache.get(&element, "MultipleAnnotation").unwrap(),
            Some(AnnotationValue::Int(1))
        );
        assert_eq!(cache.stats(), CacheStats { memory_entries: 1, hits: 0, misses: 1 });

        // Any other name on the same element - cache hit
        assert_eq!(
            cache.get_all(&element, "SingleAnnotation").unwrap(),
            vec![AnnotationValue::Bool(true)]
        );
        assert_eq!(cache.stats(), CacheStats { memory_entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn test_get_all_and_get_agree() {
        let cache = AnnotationCache::new();
        let element = DocBlock::new("Mock", MOCK);

        let all = cache.get_all(&element, "@MultipleAnnotation").unwrap();
        assert_eq!(all, vec![AnnotationValue::Int(1), AnnotationValue::Int(2)]);
        assert_eq!(
            cache.get(&element, "MultipleAnnotation").unwrap().as_ref(),
            all.first()
        );
    }

    #[test]
    fn test_absent_is_distinct_from_false() {
        let cache = AnnotationCache::new();
        let element = DocBlock::new("Mock", MOCK);

        assert_eq!(cache.get(&element, "DoesNotExist").unwrap(), None);
        assert!(cache.get_all(&element, "DoesNotExist").unwrap().is_empty());
        assert_eq!(
            cache.get(&element, "False").unwrap(),
            Some(AnnotationValue::Bool(false))
        );
    }

    #[test]
    fn test_repeated_lookups_are_stable() {
        let cache = AnnotationCache::new();
        let element = DocBlock::new("Mock", MOCK);

        let first = cache.get_all(&element, "MultipleAnnotation").unwrap();
        let second = cache.get_all(&element, "MultipleAnnotation").unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.annotations(&element).unwrap(), parse(MOCK));
    }

    #[test]
    fn test_annotations_returns_detached_copy() {
        let cache = AnnotationCache::new();
        let element = DocBlock::new("Mock", MOCK);

        let copy = cache.annotations(&element).unwrap();
        assert_eq!(copy.all("MultipleAnnotation").len(), 2);
        assert_eq!(
            copy.names().collect::<Vec<_>>(),
            vec!["@MultipleAnnotation", "@SingleAnnotation", "@False"]
        );
        drop(copy);
        assert_eq!(cache.annotations(&element).unwrap(), parse(MOCK));
        assert_eq!(cache.stats(), CacheStats { memory_entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn test_identity_keeps_same_comment_apart() {
        let cache = AnnotationCache::new();
        let a = DocBlock::new("A", "/** @Tag a */");
        let b = DocBlock::new("B", "/** @Tag a */");

        cache.get(&a, "Tag").unwrap();
        cache.get(&b, "Tag").unwrap();
        assert_eq!(cache.stats().memory_entries, 2);
    }

    #[test]
    fn test_changed_comment_is_reparsed() {
        let cache = AnnotationCache::new();
        let before = DocBlock::new("Element", "/** @Version 1 */");
        let after = DocBlock::new("Element", "/** @Version 2 */");

        assert_eq!(cache.get(&before, "Version").unwrap(), Some(AnnotationValue::Int(1)));
        assert_eq!(cache.get(&after, "Version").unwrap(), Some(AnnotationValue::Int(2)));
        assert_eq!(cache.stats(), CacheStats { memory_entries: 1, hits: 0, misses: 2 });
    }

    #[test]
    fn test_clear() {
        let cache = AnnotationCache::new();
        cache.get(&DocBlock::new("A", "/** @A */"), "A").unwrap();
        cache.clear();
        assert_eq!(cache.stats(), CacheStats { memory_entries: 0, hits: 0, misses: 0 });
    }

    #[test]
    fn test_unsupported_reflector_fails_fast() {
        struct Opaque;

        impl Reflector for Opaque {
            fn identity(&self) -> Cow<'_, str> {
                Cow::Borrowed("opaque")
            }

            fn kind(&self) -> &'static str {
                "opaque"
            }
        }

        let cache = AnnotationCache::new();
        assert!(matches!(
            cache.get(&Opaque, "A"),
            Err(Error::UnsupportedReflector { kind: "opaque", .. })
        ));
        assert_eq!(cache.stats().memory_entries, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = AnnotationCache::new();
        let element = DocBlock::new("Mock", MOCK);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    assert_eq!(
                        cache.get_all(&element, "MultipleAnnotation").unwrap().len(),
                        2
                    );
                });
            }
        });
        assert_eq!(cache.stats().memory_entries, 1);
    }
}

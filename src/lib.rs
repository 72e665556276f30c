pub mod cache;
pub mod coerce;
pub mod error;
pub mod parser;
pub mod reflector;
pub mod scanner;
pub mod value;
#[cfg(feature = "node")]
pub mod bridge;
pub mod analyzer {
    pub mod extract;
    pub mod metadata;
}

// Re-export selected API for consumers
pub use analyzer::extract::{extract_elements, ElementKind, SourceElement};
pub use analyzer::metadata::{IndexOptions, SourceIndex};
pub use cache::{AnnotationCache, CacheStats};
pub use error::{Error, Result};
pub use parser::{normalize_name, parse, Annotations};
pub use reflector::{DocBlock, Reflector};
pub use value::AnnotationValue;

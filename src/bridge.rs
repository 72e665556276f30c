use crate::analyzer::extract::extract_elements;
use crate::cache::AnnotationCache;
use crate::parser;
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::sync::OnceLock;

/// One cache for the lifetime of the loaded addon
fn cache() -> &'static AnnotationCache {
    static CACHE: OnceLock<AnnotationCache> = OnceLock::new();
    CACHE.get_or_init(AnnotationCache::new)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::from_reason(format!("serialize annotations failed: {}", e)))
}

fn lookup_element(
    source: &str,
    file_name: &str,
    element: &str,
) -> Result<crate::analyzer::extract::SourceElement> {
    extract_elements(source, file_name)
        .map_err(|err| Error::from_reason(err.to_string()))?
        .into_iter()
        .find(|e| e.qualified_name == element)
        .ok_or_else(|| Error::from_reason(format!("no element `{}` in {}", element, file_name)))
}

#[napi]
pub fn parse_doc_comment(comment: String) -> Result<String> {
    to_json(&parser::parse(&comment))
}

#[napi]
pub fn get_annotation(
    source: String,
    file_name: String,
    element: String,
    name: String,
) -> Result<Option<String>> {
    let element = lookup_element(&source, &file_name, &element)?;
    let value = cache()
        .get(&element, &name)
        .map_err(|err| Error::from_reason(err.to_string()))?;
    value.as_ref().map(to_json).transpose()
}

#[napi]
pub fn get_all_annotations(
    source: String,
    file_name: String,
    element: String,
    name: String,
) -> Result<String> {
    let element = lookup_element(&source, &file_name, &element)?;
    let values = cache()
        .get_all(&element, &name)
        .map_err(|err| Error::from_reason(err.to_string()))?;
    to_json(&values)
}

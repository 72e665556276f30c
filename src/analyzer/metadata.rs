use crate::analyzer::extract::{extract_elements, SourceElement};
use crate::cache::AnnotationCache;
use crate::error::{Error, Result};
use crate::parser::Annotations;
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which files a project walk picks up.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// File extensions without the dot
    pub extensions: Vec<String>,
    /// Directory names skipped anywhere in the tree
    pub skip_dirs: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            extensions: ["ts", "tsx", "js", "jsx"].map(String::from).to_vec(),
            skip_dirs: ["node_modules", "dist", "build", ".git", "target"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Serialize)]
struct ElementSnapshot {
    kind: &'static str,
    line: usize,
    annotations: Annotations,
}

/// Documented elements of a set of source files, grouped by file.
#[derive(Debug, Default)]
pub struct SourceIndex {
    pub by_file: Arc<DashMap<String, Vec<SourceElement>>>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `project_root` and index every matching file in parallel.
    ///
    /// Files that cannot be read or parsed are logged and left out.
    pub fn index_project(project_root: &str, options: &IndexOptions) -> Self {
        let index = Self::new();
        let files = find_all_source_files(project_root, options);

        files.par_iter().for_each(|file_path| {
            if let Err(err) = index.index_file(file_path) {
                warn!(file = %file_path, error = %err, "skipping file");
            }
        });

        info!(
            root = project_root,
            files = index.by_file.len(),
            elements = index.element_count(),
            "indexed project"
        );
        index
    }

    /// Read, parse and (re)index a single file.
    pub fn index_file(&self, file_path: &str) -> Result<()> {
        let source = std::fs::read_to_string(file_path).map_err(|source| Error::Io {
            path: file_path.into(),
            source,
        })?;
        self.index_source(file_path, &source)
    }

    /// Index already loaded source text under `file_path`.
    pub fn index_source(&self, file_path: &str, source: &str) -> Result<()> {
        let elements = extract_elements(source, file_path)?;
        debug!(file = file_path, elements = elements.len(), "extracted elements");
        self.by_file.insert(file_path.to_string(), elements);
        Ok(())
    }

    /// Look up an element by its full identity (`<file>::<qualified name>`).
    pub fn element(&self, identity: &str) -> Result<SourceElement> {
        self.by_file
            .iter()
            .find_map(|entry| entry.value().iter().find(|e| e.identity == identity).cloned())
            .ok_or_else(|| Error::ElementNotFound(identity.to_string()))
    }

    /// Look up an element of `file_path` by `Class` or `Class::member`.
    pub fn find(&self, file_path: &str, qualified_name: &str) -> Result<SourceElement> {
        self.by_file
            .get(file_path)
            .and_then(|elements| {
                elements
                    .iter()
                    .find(|e| e.qualified_name == qualified_name)
                    .cloned()
            })
            .ok_or_else(|| Error::ElementNotFound(format!("{file_path}::{qualified_name}")))
    }

    /// Indexed file paths, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.by_file.iter().map(|e| e.key().clone()).collect();
        files.sort();
        files
    }

    /// Elements of one file in source order.
    pub fn elements_in(&self, file_path: &str) -> Vec<SourceElement> {
        self.by_file
            .get(file_path)
            .map(|elements| elements.value().clone())
            .unwrap_or_default()
    }

    pub fn element_count(&self) -> usize {
        self.by_file.iter().map(|e| e.value().len()).sum()
    }

    /// Snapshot of every annotated element: file -> identity -> annotations.
    ///
    /// Elements without annotations are left out.
    pub fn to_json(&self, cache: &AnnotationCache) -> Result<String> {
        let mut snapshot: BTreeMap<String, BTreeMap<String, ElementSnapshot>> = BTreeMap::new();

        for file in self.files() {
            let mut entries = BTreeMap::new();
            for element in self.elements_in(&file) {
                let annotations = cache.annotations(&element)?;
                if annotations.is_empty() {
                    continue;
                }
                entries.insert(
                    element.identity,
                    ElementSnapshot {
                        kind: element.kind.as_str(),
                        line: element.line,
                        annotations,
                    },
                );
            }
            if !entries.is_empty() {
                snapshot.insert(file, entries);
            }
        }

        Ok(serde_json::to_string_pretty(&snapshot)?)
    }
}

pub fn find_all_source_files(root: &str, options: &IndexOptions) -> Vec<String> {
    use walkdir::WalkDir;
    let mut out = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() {
            // skip common heavy dirs
            if p.components().any(|c| {
                let s = c.as_os_str();
                options.skip_dirs.iter().any(|dir| s == dir.as_str())
            }) {
                continue;
            }
            if has_extension(p, &options.extensions) {
                out.push(p.to_string_lossy().to_string());
            }
        }
    }
    out.sort();
    out
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .is_some_and(|ext| extensions.iter().any(|wanted| ext == wanted.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AnnotationValue;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) -> String {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_find_all_source_files_skips_heavy_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let kept = write(dir.path(), "src/a.ts", "");
        let kept_js = write(dir.path(), "lib/b.jsx", "");
        write(dir.path(), "node_modules/pkg/index.js", "");
        write(dir.path(), "dist/a.js", "");
        write(dir.path(), "README.md", "");

        let mut expected = vec![kept, kept_js];
        expected.sort();
        let root = dir.path().to_string_lossy().to_string();
        assert_eq!(find_all_source_files(&root, &IndexOptions::default()), expected);
    }

    #[test]
    fn test_index_project_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(
            dir.path(),
            "src/model.ts",
            "/** @Entity\n * @Table \"users\" */\nexport class User {\n  /** @Column */\n  id = 0;\n}\n",
        );
        write(dir.path(), "src/broken.ts", "export class {");

        let root = dir.path().to_string_lossy().to_string();
        let index = SourceIndex::index_project(&root, &IndexOptions::default());
        assert_eq!(index.files(), vec![model.clone()]);
        assert_eq!(index.element_count(), 2);

        let cache = AnnotationCache::new();
        let user = index.find(&model, "User").unwrap();
        assert_eq!(
            cache.get(&user, "Table").unwrap(),
            Some(AnnotationValue::from("users"))
        );

        let id = index.element(&format!("{model}::User::id")).unwrap();
        assert_eq!(cache.get(&id, "@Column").unwrap(), Some(AnnotationValue::Bool(true)));

        assert!(matches!(
            index.find(&model, "User::missing"),
            Err(Error::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_to_json_empty_index() {
        let index = SourceIndex::new();
        assert_eq!(index.to_json(&AnnotationCache::new()).unwrap(), "{}");
    }

    #[test]
    fn test_index_file_missing() {
        let index = SourceIndex::new();
        assert!(matches!(
            index.index_file("/definitely/not/here.ts"),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_to_json_skips_unannotated() {
        let index = SourceIndex::new();
        index
            .index_source(
                "app.ts",
                "/** @Controller \"/app\" */\nclass App {\n  plain() {}\n  /** @Get dog, cat */\n  pets() {}\n}\n",
            )
            .unwrap();

        let cache = AnnotationCache::new();
        let json: serde_json::Value = serde_json::from_str(&index.to_json(&cache).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "app.ts": {
                    "app.ts::App": {
                        "kind": "class",
                        "line": 2,
                        "annotations": { "@Controller": ["/app"] }
                    },
                    "app.ts::App::pets": {
                        "kind": "method",
                        "line": 5,
                        "annotations": { "@Get": [["dog", "cat"]] }
                    }
                }
            })
        );
    }
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use swc_common::{
    comments::{CommentKind, Comments, SingleThreadedComments},
    BytePos, FileName, Globals, SourceMap, Span, Spanned, GLOBALS,
};
use swc_ecma_ast::{
    Class, ClassDecl, ClassExpr, ClassMember, Decl, Decorator, DefaultDecl, ExportDecl,
    ExportDefaultDecl, Module, PropName,
};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

use crate::error::{Error, Result};
use crate::reflector::Reflector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Class,
    Constructor,
    Method,
    Property,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Class => "class",
            ElementKind::Constructor => "constructor",
            ElementKind::Method => "method",
            ElementKind::Property => "property",
        }
    }
}

/// A class or class member found in a source file, with its doc comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceElement {
    /// `<file>::<qualified_name>`, unique across an index
    pub identity: String,
    /// `Class` or `Class::member`; repeats within a file get a `#n` suffix
    pub qualified_name: String,
    pub kind: ElementKind,
    pub file_path: String,
    /// 1-based
    pub line: usize,
    /// Verbatim `/** ... */` block, if the element has one
    pub doc_comment: Option<String>,
}

impl Reflector for SourceElement {
    fn identity(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.identity)
    }

    fn kind(&self) -> &'static str {
        self.kind.as_str()
    }

    fn doc_comment(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(self.doc_comment.as_deref().unwrap_or("")))
    }
}

struct DocCommentCollector<'a> {
    file_path: &'a str,
    source_map: &'a SourceMap,
    comments: &'a SingleThreadedComments,
    /// Start of the `export` keyword in front of the class being visited
    export_start: Option<BytePos>,
    seen: HashMap<String, usize>,
    elements: Vec<SourceElement>,
}

/// Member data needed to record it: name, kind, span, key span, decorators.
type MemberParts<'m> = (String, ElementKind, Span, Span, &'m [Decorator]);

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string_lossy().to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        // computed and bigint keys have no stable name
        _ => None,
    }
}

fn member_parts(member: &ClassMember) -> Option<MemberParts<'_>> {
    match member {
        ClassMember::Constructor(c) => Some((
            "constructor".to_string(),
            ElementKind::Constructor,
            c.span,
            c.key.span(),
            &[],
        )),
        ClassMember::Method(m) => Some((
            prop_name(&m.key)?,
            ElementKind::Method,
            m.span,
            m.key.span(),
            &m.function.decorators,
        )),
        ClassMember::PrivateMethod(m) => Some((
            format!("#{}", m.key.name),
            ElementKind::Method,
            m.span,
            m.key.span,
            &m.function.decorators,
        )),
        ClassMember::ClassProp(p) => Some((
            prop_name(&p.key)?,
            ElementKind::Property,
            p.span,
            p.key.span(),
            &p.decorators,
        )),
        ClassMember::PrivateProp(p) => Some((
            format!("#{}", p.key.name),
            ElementKind::Property,
            p.span,
            p.key.span,
            &p.decorators,
        )),
        _ => None,
    }
}

impl DocCommentCollector<'_> {
    /// Last `/** */` block leading any of `anchors`, tried in order.
    fn doc_comment_at(&self, anchors: &[BytePos]) -> Option<String> {
        anchors.iter().find_map(|pos| {
            self.comments
                .get_leading(*pos)?
                .into_iter()
                .rev()
                .find(|c| matches!(c.kind, CommentKind::Block) && c.text.starts_with('*'))
                .map(|c| format!("/*{}*/", c.text))
        })
    }

    fn record(
        &mut self,
        qualified_name: String,
        kind: ElementKind,
        start: BytePos,
        anchors: &[BytePos],
    ) {
        let occurrence = {
            let count = self.seen.entry(qualified_name.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let qualified_name = if occurrence > 1 {
            format!("{qualified_name}#{occurrence}")
        } else {
            qualified_name
        };

        let doc_comment = self.doc_comment_at(anchors);
        self.elements.push(SourceElement {
            identity: format!("{}::{}", self.file_path, qualified_name),
            qualified_name,
            kind,
            file_path: self.file_path.to_string(),
            line: self.source_map.lookup_char_pos(start).line,
            doc_comment,
        });
    }

    fn collect_class(&mut self, name: String, class: &Class) {
        let mut anchors: Vec<BytePos> = self.export_start.take().into_iter().collect();
        anchors.extend(class.decorators.iter().map(|d| d.span.lo));
        anchors.push(class.span.lo);
        self.record(name.clone(), ElementKind::Class, class.span.lo, &anchors);

        for member in &class.body {
            let Some((member_name, kind, span, key_span, decorators)) = member_parts(member) else {
                continue;
            };
            let mut anchors: Vec<BytePos> = decorators.iter().map(|d| d.span.lo).collect();
            anchors.push(span.lo);
            anchors.push(key_span.lo);
            self.record(format!("{name}::{member_name}"), kind, span.lo, &anchors);
        }

        // nested classes inside method bodies and initializers
        class.visit_children_with(self);
    }
}

impl Visit for DocCommentCollector<'_> {
    fn visit_export_decl(&mut self, export: &ExportDecl) {
        if let Decl::Class(_) = &export.decl {
            self.export_start = Some(export.span.lo);
        }
        export.visit_children_with(self);
        self.export_start = None;
    }

    fn visit_export_default_decl(&mut self, export: &ExportDefaultDecl) {
        match &export.decl {
            DefaultDecl::Class(class_expr) => {
                self.export_start = Some(export.span.lo);
                let name = class_expr
                    .ident
                    .as_ref()
                    .map(|ident| ident.sym.to_string())
                    .unwrap_or_else(|| "default".to_string());
                self.collect_class(name, &class_expr.class);
                self.export_start = None;
            }
            _ => export.visit_children_with(self),
        }
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.collect_class(decl.ident.sym.to_string(), &decl.class);
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        match &expr.ident {
            Some(ident) => self.collect_class(ident.sym.to_string(), &expr.class),
            None => expr.visit_children_with(self),
        }
    }
}

fn syntax_for(file_path: &str) -> Syntax {
    let is_ts = [".ts", ".tsx", ".mts", ".cts"]
        .iter()
        .any(|ext| file_path.ends_with(ext));
    if is_ts {
        Syntax::Typescript(TsSyntax {
            tsx: file_path.ends_with(".tsx"),
            decorators: true,
            dts: file_path.ends_with(".d.ts"),
            no_early_errors: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: file_path.ends_with(".jsx"),
            decorators: true,
            ..Default::default()
        })
    }
}

fn parse_module(
    source: &str,
    file_path: &str,
    source_map: &SourceMap,
    comments: &SingleThreadedComments,
) -> Result<Module> {
    let source_file =
        source_map.new_source_file(FileName::Real(file_path.into()).into(), source.to_string());
    let mut parser = Parser::new(
        syntax_for(file_path),
        StringInput::from(&*source_file),
        Some(comments),
    );
    parser.parse_module().map_err(|e| Error::Parse {
        path: file_path.to_string(),
        message: e.kind().msg().into_owned(),
    })
}

/// Collect every named class and class member of a JS/TS source file.
pub fn extract_elements(source: &str, file_path: &str) -> Result<Vec<SourceElement>> {
    GLOBALS.set(&Globals::new(), || {
        let source_map = SourceMap::default();
        let comments = SingleThreadedComments::default();
        let module = parse_module(source, file_path, &source_map, &comments)?;

        let mut collector = DocCommentCollector {
            file_path,
            source_map: &source_map,
            comments: &comments,
            export_start: None,
            seen: HashMap::new(),
            elements: Vec::new(),
        };
        module.visit_with(&mut collector);
        Ok(collector.elements)
    })
}

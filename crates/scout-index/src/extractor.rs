//! Declaration-level chunk extraction from tree-sitter syntax trees.

use tree_sitter::{Node, Parser};

use crate::chunk::{Chunk, ChunkType, EmbeddingType, keys};
use crate::error::{IndexError, Result};
use crate::languages::Lang;
use crate::rules::{LanguageRules, NodeRule, rules_for};

/// Node kinds accepted as a declared name by the lookahead search.
const IDENT_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "field_identifier",
    "property_identifier",
    "package_identifier",
    "namespace_identifier",
    "qualified_identifier",
    "scoped_identifier",
    "destructor_name",
    "operator_name",
    "constant",
    "name",
];

const LOOKAHEAD_DEPTH: usize = 2;
const LOOKAHEAD_NODES: usize = 12;
const MEMBER_DEPTH: usize = 3;

/// Shared context for one file's extraction.
struct Ctx<'a> {
    source: &'a str,
    file_path: &'a str,
    lang: Lang,
    rules: &'static LanguageRules,
    package: String,
    imports: String,
}

/// Parse `source` and extract one chunk per recognised declaration.
///
/// A clean file without recognised declarations yields an empty list.
///
/// # Errors
///
/// Returns [`IndexError::Parse`] when the language has no extractor, the parser
/// produces no tree, or the tree contains syntax errors and no declaration
/// could be recovered.
pub fn extract(source: &str, file_path: &str, lang: Lang) -> Result<Vec<Chunk>> {
    let rules = rules_for(lang)
        .ok_or_else(|| IndexError::Parse(format!("no extraction rules for {}", lang.id())))?;
    let grammar = lang
        .grammar()
        .ok_or_else(|| IndexError::Parse(format!("no grammar for {}", lang.id())))?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| IndexError::Parse(format!("set_language failed: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| IndexError::Parse(format!("parse failed for {file_path}")))?;
    let root = tree.root_node();

    let mut ctx = Ctx {
        source,
        file_path,
        lang,
        rules,
        package: String::new(),
        imports: String::new(),
    };
    ctx.collect_file_metadata(root);

    let mut chunks = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(chunk) = ctx.chunk_for(node) {
            chunks.push(chunk);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    if chunks.is_empty() && root.has_error() {
        return Err(IndexError::Parse(format!(
            "syntax errors in {file_path} and no declarations recovered"
        )));
    }
    Ok(chunks)
}

impl Ctx<'_> {
    fn text(&self, node: Node) -> &str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    fn collect_file_metadata(&mut self, root: Node) {
        let mut imports = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if let Some((kind, item_kinds)) = self.rules.package
                && child.kind() == kind
                && self.package.is_empty()
                && let Some(name) = find_descendant(child, item_kinds, LOOKAHEAD_DEPTH)
            {
                self.package = self.text(name).to_owned();
            }
            for rule in self.rules.imports.iter().filter(|r| r.kind == child.kind()) {
                let before = imports.len();
                if let Some(item_kind) = rule.item {
                    for item in descendants_of_kind(child, item_kind) {
                        let target = rule
                            .field
                            .and_then(|f| item.child_by_field_name(f))
                            .unwrap_or(item);
                        imports.push(normalize_import(self.text(target)));
                    }
                }
                if imports.len() == before {
                    let target = rule
                        .field
                        .and_then(|f| child.child_by_field_name(f))
                        .unwrap_or(child);
                    imports.push(normalize_import(self.text(target)));
                }
            }
        }
        imports.retain(|i| !i.is_empty());
        self.imports = imports.join(", ");
    }

    fn classify(&self, node: Node) -> Option<ChunkType> {
        let kind = node.kind();
        let chunk_type = match self.rules.rule(kind)? {
            NodeRule::Plain(t) => *t,
            NodeRule::ByField { field, kinds } => {
                let target = node.child_by_field_name(field)?;
                kinds.iter().find(|(k, _)| *k == target.kind())?.1
            }
        };
        if self.rules.needs_body.contains(&kind) && node.child_by_field_name("body").is_none() {
            return None;
        }
        Some(chunk_type)
    }

    /// Nearest ancestor that makes a function a method. Stops at an enclosing
    /// function so nested closures stay functions.
    fn method_scope<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut current = node.parent();
        while let Some(parent) = current {
            if self.rules.method_scopes.contains(&parent.kind()) {
                return Some(parent);
            }
            if matches!(
                self.rules.rule(parent.kind()),
                Some(NodeRule::Plain(ChunkType::Function | ChunkType::Method))
            ) {
                return None;
            }
            current = parent.parent();
        }
        None
    }

    /// Wrapper parent whose span stands in for `node`, if any.
    fn wrapper<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let parent = node.parent()?;
        if !self.rules.wrappers.contains(&parent.kind()) {
            return None;
        }
        let mut cursor = parent.walk();
        let same_kind = parent
            .named_children(&mut cursor)
            .filter(|c| c.kind() == node.kind())
            .count();
        (same_kind == 1).then_some(parent)
    }

    fn chunk_for(&self, node: Node) -> Option<Chunk> {
        let mut chunk_type = self.classify(node)?;
        let scope = self.method_scope(node);
        if chunk_type == ChunkType::Function && scope.is_some() {
            chunk_type = ChunkType::Method;
        }

        let wrapper = self.wrapper(node);
        let name = self
            .resolve_name(node)
            .or_else(|| wrapper.and_then(|w| self.resolve_name(w)))?;

        let span = wrapper.unwrap_or(node);
        let content = self.text(span);
        if content.trim().is_empty() {
            return None;
        }

        let start = span.start_position();
        let end = span.end_position();
        let line_start = start.row + 1;
        let line_end = if end.column == 0 && end.row > start.row {
            end.row
        } else {
            end.row + 1
        };

        let mut chunk = Chunk::new(
            self.file_path,
            self.lang.id(),
            content.to_owned(),
            (line_start, line_end),
            chunk_type,
            EmbeddingType::Code,
        )
        .with_name(name);

        chunk.set_meta(keys::LANGUAGE, self.lang.id());
        chunk.set_meta(keys::PACKAGE, self.package.as_str());
        chunk.set_meta(keys::IMPORTS, self.imports.as_str());

        if matches!(chunk_type, ChunkType::Function | ChunkType::Method) {
            chunk.set_meta(keys::SIGNATURE, self.signature(node));
            if chunk_type == ChunkType::Method {
                let receiver = node
                    .child_by_field_name("receiver")
                    .map(|r| self.go_receiver(r))
                    .or_else(|| scope.and_then(|s| self.resolve_name(s)))
                    .unwrap_or_default();
                chunk.set_meta(keys::RECEIVER, receiver);
            }
        } else {
            chunk.set_meta(keys::FIELDS, self.members(node).join(", "));
        }

        let doc = self
            .leading_comment(span)
            .or_else(|| self.docstring(node))
            .unwrap_or_default();
        chunk.set_meta(keys::DOC_COMMENT, doc);

        Some(chunk)
    }

    fn resolve_name(&self, node: Node) -> Option<String> {
        self.name_from_fields(node, 0)
            .or_else(|| self.lookahead(node))
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
    }

    fn name_from_fields(&self, node: Node, depth: usize) -> Option<String> {
        for field in self.rules.name_fields {
            let Some(child) = node.child_by_field_name(field) else {
                continue;
            };
            if IDENT_KINDS.contains(&child.kind()) {
                return Some(self.text(child).to_owned());
            }
            if depth < 4
                && let Some(name) = self.name_from_fields(child, depth + 1)
            {
                return Some(name);
            }
            if let Some(name) = self.lookahead(child) {
                return Some(name);
            }
        }
        None
    }

    /// First identifier-like node within a short breadth-first window.
    fn lookahead(&self, node: Node) -> Option<String> {
        find_descendant(node, IDENT_KINDS, LOOKAHEAD_DEPTH).map(|n| self.text(n).to_owned())
    }

    fn signature(&self, node: Node) -> String {
        let params = field_through_declarators(node, "parameters").map(|p| self.text(p));
        let ret = self
            .rules
            .return_fields
            .iter()
            .find_map(|f| node.child_by_field_name(f))
            .map(|r| self.text(r));
        match (params, ret) {
            (Some(p), Some(r)) => format!("{p} {r}"),
            (Some(p), None) => p.to_owned(),
            (None, Some(r)) => r.to_owned(),
            (None, None) => String::new(),
        }
    }

    fn go_receiver(&self, receiver: Node) -> String {
        let mut cursor = receiver.walk();
        let declared = receiver
            .named_children(&mut cursor)
            .find_map(|p| p.child_by_field_name("type"))
            .map(|t| self.text(t).to_owned());
        declared.unwrap_or_else(|| {
            let text = self.text(receiver);
            let inner = text.trim_start_matches('(').trim_end_matches(')').trim();
            inner
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .to_owned()
        })
    }

    fn members(&self, node: Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut stack: Vec<(Node, usize)> = vec![(node, 0)];
        while let Some((current, depth)) = stack.pop() {
            let mut cursor = current.walk();
            let children: Vec<Node> = current.named_children(&mut cursor).collect();
            for child in children.into_iter().rev() {
                if self.rules.members.contains(&child.kind()) {
                    if let Some(name) = self.resolve_name(child) {
                        names.push((child.start_byte(), name));
                    }
                } else if depth + 1 < MEMBER_DEPTH && self.classify(child).is_none() {
                    stack.push((child, depth + 1));
                }
            }
        }
        names.sort_by_key(|(pos, _)| *pos);
        names.into_iter().map(|(_, n)| n).collect()
    }

    /// Contiguous comment siblings directly above `span`.
    fn leading_comment(&self, span: Node) -> Option<String> {
        let mut lines = Vec::new();
        let mut anchor_row = span.start_position().row;
        let mut prev = span.prev_sibling();
        while let Some(sibling) = prev {
            if self.rules.doc_skip.contains(&sibling.kind()) {
                anchor_row = sibling.start_position().row;
                prev = sibling.prev_sibling();
                continue;
            }
            if !self.rules.comments.contains(&sibling.kind())
                || sibling.end_position().row + 1 < anchor_row
            {
                break;
            }
            lines.push(strip_comment_markers(self.text(sibling)));
            anchor_row = sibling.start_position().row;
            prev = sibling.prev_sibling();
        }
        lines.reverse();
        let doc = lines.join("\n").trim().to_owned();
        (!doc.is_empty()).then_some(doc)
    }

    fn docstring(&self, node: Node) -> Option<String> {
        if !self.rules.docstrings {
            return None;
        }
        let body = node.child_by_field_name("body")?;
        let first = body.named_child(0)?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let literal = first.named_child(0).filter(|n| n.kind() == "string")?;
        let text = self.text(literal);
        let doc = ["\"\"\"", "'''", "\"", "'"]
            .iter()
            .find_map(|q| text.strip_prefix(q).and_then(|t| t.strip_suffix(q)))
            .unwrap_or(text)
            .trim()
            .to_owned();
        (!doc.is_empty()).then_some(doc)
    }
}

/// Breadth-first search for the first descendant of one of `kinds`.
fn find_descendant<'t>(node: Node<'t>, kinds: &[&str], max_depth: usize) -> Option<Node<'t>> {
    let mut queue = std::collections::VecDeque::from([(node, 0usize)]);
    let mut visited = 0;
    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth || visited >= LOOKAHEAD_NODES {
            continue;
        }
        let mut cursor = current.walk();
        for child in current.named_children(&mut cursor) {
            visited += 1;
            if kinds.contains(&child.kind()) {
                return Some(child);
            }
            queue.push_back((child, depth + 1));
        }
    }
    None
}

/// All descendants of `kind`, without descending into matches.
fn descendants_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        let mut cursor = current.walk();
        let children: Vec<Node> = current.named_children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            if child.kind() == kind {
                found.push(child);
            } else {
                stack.push(child);
            }
        }
    }
    found.sort_by_key(Node::start_byte);
    found
}

/// Look up `field` on the node or along its `declarator` chain (C function
/// definitions keep their parameter list on the nested declarator).
fn field_through_declarators<'t>(node: Node<'t>, field: &str) -> Option<Node<'t>> {
    let mut current = node;
    for _ in 0..6 {
        if let Some(found) = current.child_by_field_name(field) {
            return Some(found);
        }
        current = current.child_by_field_name("declarator")?;
    }
    None
}

fn normalize_import(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches(';').trim();
    let trimmed = trimmed.strip_prefix("import ").unwrap_or(trimmed).trim();
    trimmed
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>'))
        .to_owned()
}

fn strip_comment_markers(comment: &str) -> String {
    comment
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line
                .strip_prefix("///")
                .or_else(|| line.strip_prefix("//!"))
                .or_else(|| line.strip_prefix("//"))
                .or_else(|| line.strip_prefix("/**"))
                .or_else(|| line.strip_prefix("/*"))
                .or_else(|| line.strip_prefix('#'))
                .unwrap_or(line);
            let line = line.strip_suffix("*/").unwrap_or(line).trim();
            line.strip_prefix('*').unwrap_or(line).trim().to_owned()
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

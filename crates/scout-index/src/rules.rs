//! Per-language extraction rules.
//!
//! Each grammar-backed language is described by one [`LanguageRules`] table.
//! The extractor is fully driven by these tables, so supporting another
//! grammar means adding a table here and a grammar in `languages.rs`.

use crate::chunk::ChunkType;
use crate::languages::Lang;

/// How a matched node kind becomes a chunk type.
#[derive(Debug)]
pub(crate) enum NodeRule {
    /// The node kind always yields this chunk type.
    Plain(ChunkType),
    /// The chunk type is chosen by the kind of the node behind `field`;
    /// unmatched kinds are skipped.
    ByField {
        field: &'static str,
        kinds: &'static [(&'static str, ChunkType)],
    },
}

/// Import node kind and where its path lives.
#[derive(Debug)]
pub(crate) struct ImportRule {
    pub kind: &'static str,
    /// Descendant kind holding one import each (Go `import_spec`).
    pub item: Option<&'static str>,
    /// Field holding the import path; the whole node text when `None`.
    pub field: Option<&'static str>,
}

#[derive(Debug)]
pub(crate) struct LanguageRules {
    pub nodes: &'static [(&'static str, NodeRule)],
    /// Kinds emitted only when they carry a `body` field (C `struct foo x;`
    /// is a use, not a declaration).
    pub needs_body: &'static [&'static str],
    /// Fields tried, in order, to resolve a declared name.
    pub name_fields: &'static [&'static str],
    pub return_fields: &'static [&'static str],
    /// Ancestors that turn a function into a method and name its receiver.
    pub method_scopes: &'static [&'static str],
    /// Parents whose span and leading comment replace the inner node's.
    pub wrappers: &'static [&'static str],
    pub comments: &'static [&'static str],
    /// Siblings skipped while looking for a leading comment.
    pub doc_skip: &'static [&'static str],
    /// Leading string literal of the body is the documentation.
    pub docstrings: bool,
    /// Member declarations listed in the `fields` metadata.
    pub members: &'static [&'static str],
    pub imports: &'static [ImportRule],
    /// Package declaration kind and the kinds holding its name.
    pub package: Option<(&'static str, &'static [&'static str])>,
}

const GO: LanguageRules = LanguageRules {
    nodes: &[
        ("function_declaration", NodeRule::Plain(ChunkType::Function)),
        ("method_declaration", NodeRule::Plain(ChunkType::Method)),
        (
            "type_spec",
            NodeRule::ByField {
                field: "type",
                kinds: &[
                    ("struct_type", ChunkType::Struct),
                    ("interface_type", ChunkType::Interface),
                ],
            },
        ),
    ],
    needs_body: &[],
    name_fields: &["name"],
    return_fields: &["result"],
    method_scopes: &[],
    wrappers: &["type_declaration"],
    comments: &["comment"],
    doc_skip: &[],
    docstrings: false,
    members: &["field_declaration", "method_elem"],
    imports: &[ImportRule {
        kind: "import_declaration",
        item: Some("import_spec"),
        field: Some("path"),
    }],
    package: Some(("package_clause", &["package_identifier"])),
};

const PYTHON: LanguageRules = LanguageRules {
    nodes: &[
        ("function_definition", NodeRule::Plain(ChunkType::Function)),
        ("class_definition", NodeRule::Plain(ChunkType::Class)),
    ],
    needs_body: &[],
    name_fields: &["name"],
    return_fields: &["return_type"],
    method_scopes: &["class_definition"],
    wrappers: &["decorated_definition"],
    comments: &["comment"],
    doc_skip: &[],
    docstrings: true,
    members: &[],
    imports: &[
        ImportRule {
            kind: "import_statement",
            item: None,
            field: None,
        },
        ImportRule {
            kind: "import_from_statement",
            item: None,
            field: Some("module_name"),
        },
    ],
    package: None,
};

const JS_IMPORTS: &[ImportRule] = &[ImportRule {
    kind: "import_statement",
    item: None,
    field: Some("source"),
}];

const JAVASCRIPT: LanguageRules = LanguageRules {
    nodes: &[
        ("function_declaration", NodeRule::Plain(ChunkType::Function)),
        (
            "generator_function_declaration",
            NodeRule::Plain(ChunkType::Function),
        ),
        ("class_declaration", NodeRule::Plain(ChunkType::Class)),
        ("method_definition", NodeRule::Plain(ChunkType::Method)),
    ],
    needs_body: &[],
    name_fields: &["name"],
    return_fields: &[],
    method_scopes: &["class_declaration", "class"],
    wrappers: &["export_statement"],
    comments: &["comment"],
    doc_skip: &[],
    docstrings: false,
    members: &["field_definition"],
    imports: JS_IMPORTS,
    package: None,
};

const TYPESCRIPT: LanguageRules = LanguageRules {
    nodes: &[
        ("function_declaration", NodeRule::Plain(ChunkType::Function)),
        (
            "generator_function_declaration",
            NodeRule::Plain(ChunkType::Function),
        ),
        ("class_declaration", NodeRule::Plain(ChunkType::Class)),
        ("abstract_class_declaration", NodeRule::Plain(ChunkType::Class)),
        ("method_definition", NodeRule::Plain(ChunkType::Method)),
        ("interface_declaration", NodeRule::Plain(ChunkType::Interface)),
        ("enum_declaration", NodeRule::Plain(ChunkType::Enum)),
        ("internal_module", NodeRule::Plain(ChunkType::Module)),
    ],
    needs_body: &[],
    name_fields: &["name"],
    return_fields: &["return_type"],
    method_scopes: &["class_declaration", "abstract_class_declaration", "class"],
    wrappers: &["export_statement"],
    comments: &["comment"],
    doc_skip: &[],
    docstrings: false,
    members: &["public_field_definition", "property_signature", "method_signature"],
    imports: JS_IMPORTS,
    package: None,
};

const JAVA: LanguageRules = LanguageRules {
    nodes: &[
        ("class_declaration", NodeRule::Plain(ChunkType::Class)),
        ("record_declaration", NodeRule::Plain(ChunkType::Class)),
        ("interface_declaration", NodeRule::Plain(ChunkType::Interface)),
        ("enum_declaration", NodeRule::Plain(ChunkType::Enum)),
        ("method_declaration", NodeRule::Plain(ChunkType::Method)),
        ("constructor_declaration", NodeRule::Plain(ChunkType::Method)),
    ],
    needs_body: &[],
    name_fields: &["name", "declarator"],
    return_fields: &["type"],
    method_scopes: &[
        "class_declaration",
        "record_declaration",
        "interface_declaration",
        "enum_declaration",
    ],
    wrappers: &[],
    comments: &["line_comment", "block_comment"],
    doc_skip: &[],
    docstrings: false,
    members: &["field_declaration"],
    imports: &[ImportRule {
        kind: "import_declaration",
        item: Some("scoped_identifier"),
        field: None,
    }],
    package: Some((
        "package_declaration",
        &["scoped_identifier", "identifier"],
    )),
};

const RUST: LanguageRules = LanguageRules {
    nodes: &[
        ("function_item", NodeRule::Plain(ChunkType::Function)),
        ("function_signature_item", NodeRule::Plain(ChunkType::Function)),
        ("struct_item", NodeRule::Plain(ChunkType::Struct)),
        ("union_item", NodeRule::Plain(ChunkType::Struct)),
        ("enum_item", NodeRule::Plain(ChunkType::Enum)),
        ("trait_item", NodeRule::Plain(ChunkType::Trait)),
        ("mod_item", NodeRule::Plain(ChunkType::Module)),
    ],
    needs_body: &["mod_item"],
    name_fields: &["name", "type"],
    return_fields: &["return_type"],
    method_scopes: &["impl_item", "trait_item"],
    wrappers: &[],
    comments: &["line_comment", "block_comment"],
    doc_skip: &["attribute_item"],
    docstrings: false,
    members: &["field_declaration", "enum_variant"],
    imports: &[ImportRule {
        kind: "use_declaration",
        item: None,
        field: Some("argument"),
    }],
    package: None,
};

const C: LanguageRules = LanguageRules {
    nodes: &[
        ("function_definition", NodeRule::Plain(ChunkType::Function)),
        ("struct_specifier", NodeRule::Plain(ChunkType::Struct)),
        ("union_specifier", NodeRule::Plain(ChunkType::Struct)),
        ("enum_specifier", NodeRule::Plain(ChunkType::Enum)),
    ],
    needs_body: &["struct_specifier", "union_specifier", "enum_specifier"],
    name_fields: &["name", "declarator"],
    return_fields: &["type"],
    method_scopes: &[],
    wrappers: &["type_definition"],
    comments: &["comment"],
    doc_skip: &[],
    docstrings: false,
    members: &["field_declaration", "enumerator"],
    imports: &[ImportRule {
        kind: "preproc_include",
        item: None,
        field: Some("path"),
    }],
    package: None,
};

const CPP: LanguageRules = LanguageRules {
    nodes: &[
        ("function_definition", NodeRule::Plain(ChunkType::Function)),
        ("class_specifier", NodeRule::Plain(ChunkType::Class)),
        ("struct_specifier", NodeRule::Plain(ChunkType::Struct)),
        ("union_specifier", NodeRule::Plain(ChunkType::Struct)),
        ("enum_specifier", NodeRule::Plain(ChunkType::Enum)),
        ("namespace_definition", NodeRule::Plain(ChunkType::Module)),
    ],
    needs_body: &[
        "class_specifier",
        "struct_specifier",
        "union_specifier",
        "enum_specifier",
    ],
    name_fields: &["name", "declarator"],
    return_fields: &["type"],
    method_scopes: &["class_specifier", "struct_specifier"],
    wrappers: &["type_definition", "template_declaration"],
    comments: &["comment"],
    doc_skip: &[],
    docstrings: false,
    members: &["field_declaration", "enumerator"],
    imports: &[ImportRule {
        kind: "preproc_include",
        item: None,
        field: Some("path"),
    }],
    package: None,
};

/// Rules for a grammar-backed language, `None` for everything else.
pub(crate) fn rules_for(lang: Lang) -> Option<&'static LanguageRules> {
    let rules = match lang {
        Lang::Go => &GO,
        Lang::Python => &PYTHON,
        Lang::JavaScript => &JAVASCRIPT,
        Lang::TypeScript => &TYPESCRIPT,
        Lang::Java => &JAVA,
        Lang::Rust => &RUST,
        Lang::C => &C,
        Lang::Cpp => &CPP,
        Lang::Ruby | Lang::Php | Lang::Scala | Lang::Markdown | Lang::Text | Lang::Rst => {
            return None;
        }
    };
    Some(rules)
}

impl LanguageRules {
    /// Chunk type a node kind maps to, before field and scope checks.
    pub(crate) fn rule(&self, kind: &str) -> Option<&NodeRule> {
        self.nodes.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }
}

//! Language detection and tree-sitter grammar registry.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunk::EmbeddingType;

/// Language recognised by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Go,
    Python,
    JavaScript,
    TypeScript,
    Java,
    Rust,
    C,
    Cpp,
    Ruby,
    Php,
    Scala,
    Markdown,
    Text,
    Rst,
}

impl Lang {
    /// Identifier stored in chunk payloads.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Rust => "rust",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Scala => "scala",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Rst => "rst",
        }
    }

    /// Get the tree-sitter grammar. Returns `None` for prose, for languages
    /// without a bundled grammar, and when the corresponding feature is off.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            #[cfg(feature = "lang-go")]
            Self::Go => Some(tree_sitter_go::LANGUAGE.into()),
            #[cfg(feature = "lang-python")]
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            #[cfg(feature = "lang-js")]
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            #[cfg(feature = "lang-js")]
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            #[cfg(feature = "lang-java")]
            Self::Java => Some(tree_sitter_java::LANGUAGE.into()),
            #[cfg(feature = "lang-rust")]
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            #[cfg(feature = "lang-c")]
            Self::C => Some(tree_sitter_c::LANGUAGE.into()),
            #[cfg(feature = "lang-c")]
            Self::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Prose languages are split by headings and embedded with the docs model.
    #[must_use]
    pub fn is_prose(self) -> bool {
        matches!(self, Self::Markdown | Self::Text | Self::Rst)
    }

    /// Whether a dedicated chunker exists: a grammar-backed declaration
    /// extractor or the heading chunker. Unsupported code languages are still
    /// indexed through the naive splitter.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self.is_prose() || self.grammar().is_some()
    }

    #[must_use]
    pub fn embedding_type(self) -> EmbeddingType {
        if self.is_prose() {
            EmbeddingType::Docs
        } else {
            EmbeddingType::Code
        }
    }

    /// Language for an extension that needs no content inspection.
    ///
    /// `.c` and `.h` resolve to their content-free default here; use
    /// [`detect_language`] when the content is at hand.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        let lang = match ext.as_str() {
            "go" => Self::Go,
            "py" => Self::Python,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "java" => Self::Java,
            "rs" => Self::Rust,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "scala" => Self::Scala,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" | "h" => Self::Cpp,
            "c" => Self::C,
            "md" | "markdown" => Self::Markdown,
            "txt" => Self::Text,
            "rst" => Self::Rst,
            _ => return None,
        };
        Some(lang)
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

const CPP_MARKERS: &[&str] = &[
    "class ",
    "namespace ",
    "template<",
    "::",
    "std::",
    "public:",
    "private:",
    "protected:",
    "typename ",
    "constexpr ",
    "nullptr",
    "virtual ",
    "override",
    "final",
    "delete",
    " new ",
];

const C_PATTERNS: &[&str] = &["struct ", "typedef ", "void ", "int ", "char ", "#include <"];

fn has_cpp_markers(content: &str) -> bool {
    CPP_MARKERS.iter().any(|m| content.contains(m))
}

fn looks_like_c_only(content: &str) -> bool {
    C_PATTERNS.iter().any(|p| content.contains(p)) && !has_cpp_markers(content)
}

/// Detect the language of a file from its extension and, for `.c` and `.h`,
/// its content.
///
/// Headers default to C++ unless they look exclusively like C; that includes
/// empty headers.
#[must_use]
pub fn detect_language(path: &Path, content: &str) -> Option<Lang> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "c" if has_cpp_markers(content) => Some(Lang::Cpp),
        "c" => Some(Lang::C),
        "h" if has_cpp_markers(content) => Some(Lang::Cpp),
        "h" if looks_like_c_only(content) => Some(Lang::C),
        "h" => Some(Lang::Cpp),
        other => Lang::from_extension(other),
    }
}

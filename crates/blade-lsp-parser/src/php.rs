//! Boundary wrapper around the external PHP-expression parser.
//!
//! Built on tree-sitter with the PHP grammar. The returned tree is opaque to
//! the template parser; only the analyzer walks it. Snippets lexed out of a
//! template (echo bodies, directive arguments, `@php` blocks) are wrapped in
//! an open tag before parsing and their node positions are mapped back into
//! host-document coordinates.

use blade_lsp_types::{Position, Span};
use tree_sitter::Parser;

/// Target PHP grammar revision. Carried through from the caller's
/// configuration; the bundled grammar accepts all supported revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhpVersion {
    pub major: u8,
    pub minor: u8,
}

impl Default for PhpVersion {
    fn default() -> Self {
        PhpVersion { major: 8, minor: 2 }
    }
}

/// Parser for host-PHP source: whole files or template-embedded snippets.
pub struct ExpressionParser {
    parser: Parser,
    version: PhpVersion,
}

impl ExpressionParser {
    pub fn new(version: PhpVersion) -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .expect("Failed to set tree-sitter PHP language");
        ExpressionParser { parser, version }
    }

    pub fn version(&self) -> PhpVersion {
        self.version
    }

    /// Parse a whole PHP document. Positions map 1:1 to the document.
    pub fn parse_source(&mut self, source: &str) -> Option<ExpressionAst> {
        let tree = self.parser.parse(source.as_bytes(), None)?;
        Some(ExpressionAst {
            tree,
            source: source.to_string(),
            prefix_len: 0,
            base: Position::default(),
        })
    }

    /// Parse a PHP snippet lexed out of a template at host position `base`.
    ///
    /// The snippet is wrapped in `<?php ` so the grammar accepts it; the
    /// wrapper is subtracted again when node spans are mapped back.
    pub fn parse_snippet(&mut self, text: &str, base: Position) -> Option<ExpressionAst> {
        const PREFIX: &str = "<?php ";
        let wrapped = format!("{}{}", PREFIX, text);
        let tree = self.parser.parse(wrapped.as_bytes(), None)?;
        Some(ExpressionAst {
            tree,
            source: wrapped,
            prefix_len: PREFIX.len(),
            base,
        })
    }
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::new(PhpVersion::default())
    }
}

/// An opaque PHP syntax tree attached into the template tree.
#[derive(Clone)]
pub struct ExpressionAst {
    tree: tree_sitter::Tree,
    source: String,
    prefix_len: usize,
    base: Position,
}

impl ExpressionAst {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// The parsed source, including any injected open-tag prefix.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Slice a node's text out of the parsed source.
    pub fn text(&self, node: tree_sitter::Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Whether the underlying parse recorded any error nodes.
    pub fn has_errors(&self) -> bool {
        self.root().has_error()
    }

    /// Map a node's byte range back into host-document coordinates. For
    /// whole-file parses this is exact; for snippets the injected prefix is
    /// subtracted and positions advance from the snippet's host position.
    pub fn host_span(&self, node: tree_sitter::Node<'_>) -> Span {
        let body = &self.source[self.prefix_len..];
        let start_byte = node.start_byte().saturating_sub(self.prefix_len).min(body.len());
        let end_byte = node.end_byte().saturating_sub(self.prefix_len).min(body.len());
        let mut start = self.base;
        start.advance(&body[..start_byte]);
        let mut end = start;
        end.advance(&body[start_byte..end_byte]);
        Span::new(start, end)
    }
}

impl std::fmt::Debug for ExpressionAst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionAst")
            .field("root", &self.root().kind())
            .field("len", &self.source.len())
            .field("base", &self.base)
            .finish()
    }
}

//! Shared types for blade-lsp.
//!
//! Contains positions and spans, symbol/reference records, import statements
//! and common data structures used across the parser and index crates.

use serde::{Deserialize, Serialize};

/// A position in a source document.
///
/// `character` is measured in UTF-16 code units to match editor protocols;
/// `offset` is the byte offset into the UTF-8 source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, character: u32, offset: usize) -> Self {
        Position {
            line,
            character,
            offset,
        }
    }

    /// Advance this position over `text`, keeping line, UTF-16 column and
    /// byte offset in sync.
    pub fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            self.offset += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.character = 0;
            } else {
                self.character += ch.len_utf16() as u32;
            }
        }
    }

    /// Convert to an LSP position (drops the byte offset).
    pub fn to_lsp_position(self) -> lsp_types::Position {
        lsp_types::Position::new(self.line, self.character)
    }
}

/// A half-open span between two positions in one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// The zero-valued sentinel used when location data is missing.
    pub fn zero() -> Self {
        Span::default()
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start.offset <= offset && offset <= self.end.offset
    }

    pub fn to_lsp_range(self) -> lsp_types::Range {
        lsp_types::Range::new(self.start.to_lsp_position(), self.end.to_lsp_position())
    }
}

/// Identifier of a symbol in a symbol table. Ids are assigned from 1, so an
/// unassigned symbol is `None`, never a reserved sentinel value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SymbolId(pub u64);

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a reference in a reference table. Assigned from 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ReferenceId(pub u64);

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of an indexed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Namespace,
    Class,
    Interface,
    Trait,
    Enum,
    EnumMember,
    Function,
    Method,
    Property,
    Parameter,
    Constant,
    ClassConstant,
}

impl SymbolKind {
    /// Convert to LSP SymbolKind.
    pub fn to_lsp_symbol_kind(self) -> lsp_types::SymbolKind {
        match self {
            SymbolKind::Namespace => lsp_types::SymbolKind::NAMESPACE,
            SymbolKind::Class => lsp_types::SymbolKind::CLASS,
            SymbolKind::Interface => lsp_types::SymbolKind::INTERFACE,
            SymbolKind::Trait => lsp_types::SymbolKind::INTERFACE,
            SymbolKind::Enum => lsp_types::SymbolKind::ENUM,
            SymbolKind::EnumMember => lsp_types::SymbolKind::ENUM_MEMBER,
            SymbolKind::Function => lsp_types::SymbolKind::FUNCTION,
            SymbolKind::Method => lsp_types::SymbolKind::METHOD,
            SymbolKind::Property => lsp_types::SymbolKind::PROPERTY,
            SymbolKind::Parameter => lsp_types::SymbolKind::VARIABLE,
            SymbolKind::Constant => lsp_types::SymbolKind::CONSTANT,
            SymbolKind::ClassConstant => lsp_types::SymbolKind::CONSTANT,
        }
    }

    /// Whether this kind addresses a member of a containing type, which
    /// changes how the fully qualified name is joined.
    pub fn is_member(self) -> bool {
        matches!(
            self,
            SymbolKind::Method
                | SymbolKind::Property
                | SymbolKind::ClassConstant
                | SymbolKind::EnumMember
                | SymbolKind::Parameter
        )
    }
}

/// Visibility modifier for class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Modifiers on a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SymbolModifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
    pub is_builtin: bool,
}

/// Type information attached to a symbol from three sources: the declared
/// type hint, the documented type, and an inferred type if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeHints {
    pub declared: Option<String>,
    pub documented: Option<String>,
    pub inferred: Option<String>,
}

/// A definition in the workspace.
///
/// `scope` is a serialized path (namespace plus container names, with a
/// member discriminator where needed) rather than a parent pointer, so
/// symbols never form a cyclic ownership graph and a source file's symbols
/// can be deleted without graph surgery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: Option<SymbolId>,
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub source_file: String,
    pub scope: String,
    pub modifiers: SymbolModifiers,
    pub value: Option<String>,
    pub types: TypeHints,
    pub related_ids: Vec<SymbolId>,
    pub reference_ids: Vec<ReferenceId>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, span: Span) -> Self {
        Symbol {
            id: None,
            name: name.into(),
            kind,
            span,
            source_file: String::new(),
            scope: String::new(),
            modifiers: SymbolModifiers::default(),
            value: None,
            types: TypeHints::default(),
            related_ids: Vec::new(),
            reference_ids: Vec::new(),
        }
    }

    /// The fully qualified name used as the cross-file resolution key.
    pub fn fqn(&self) -> String {
        match self.kind {
            SymbolKind::Namespace => self.name.clone(),
            SymbolKind::Property => format!("{}::${}", self.scope, self.name),
            k if k.is_member() => format!("{}::{}", self.scope, self.name),
            _ if self.scope.is_empty() => self.name.clone(),
            _ => format!("{}\\{}", self.scope, self.name),
        }
    }
}

/// A use of a name that should resolve to a symbol.
///
/// `resolved_symbol_id == None` means the reference is pending: its target
/// was not indexed yet when the reference was committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub id: Option<ReferenceId>,
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub source_file: String,
    pub fully_qualified_name: String,
    pub resolved_symbol_id: Option<SymbolId>,
    pub is_global: bool,
}

impl Reference {
    pub fn new(name: impl Into<String>, kind: SymbolKind, span: Span) -> Self {
        Reference {
            id: None,
            name: name.into(),
            kind,
            span,
            source_file: String::new(),
            fully_qualified_name: String::new(),
            resolved_symbol_id: None,
            is_global: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resolved_symbol_id.is_none()
    }
}

/// Kind of an import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    Class,
    Function,
    Constant,
}

/// A `use` declaration: a reference variant with an alias that feeds the
/// resolver's alias table for the remainder of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub fqn: String,
    pub alias: Option<String>,
    pub kind: ImportKind,
    pub span: Span,
    pub source_file: String,
}

impl ImportStatement {
    /// The name this import binds in the file: the explicit alias, or the
    /// last segment of the imported name.
    pub fn bound_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.fqn.rsplit('\\').next().unwrap_or(&self.fqn),
        }
    }
}

/// Everything extracted from one compiled file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
    pub import_statements: Vec<ImportStatement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_advance() {
        let mut pos = Position::default();
        pos.advance("ab\ncd");
        assert_eq!(pos.line, 1);
        assert_eq!(pos.character, 2);
        assert_eq!(pos.offset, 5);
    }

    #[test]
    fn test_position_advance_utf16() {
        let mut pos = Position::default();
        pos.advance("a\u{1F600}b"); // emoji is 2 UTF-16 units, 4 UTF-8 bytes
        assert_eq!(pos.line, 0);
        assert_eq!(pos.character, 4);
        assert_eq!(pos.offset, 6);
    }

    #[test]
    fn test_span_contains_offset() {
        let span = Span::new(Position::new(0, 2, 2), Position::new(0, 8, 8));
        assert!(span.contains_offset(2));
        assert!(span.contains_offset(8));
        assert!(!span.contains_offset(9));
    }

    #[test]
    fn test_symbol_fqn() {
        let mut class = Symbol::new("Foo", SymbolKind::Class, Span::zero());
        class.scope = "App".to_string();
        assert_eq!(class.fqn(), "App\\Foo");

        let mut method = Symbol::new("bar", SymbolKind::Method, Span::zero());
        method.scope = "App\\Foo".to_string();
        assert_eq!(method.fqn(), "App\\Foo::bar");

        let mut prop = Symbol::new("name", SymbolKind::Property, Span::zero());
        prop.scope = "App\\Foo".to_string();
        assert_eq!(prop.fqn(), "App\\Foo::$name");

        let global = Symbol::new("helper", SymbolKind::Function, Span::zero());
        assert_eq!(global.fqn(), "helper");
    }

    #[test]
    fn test_symbol_kind_to_lsp() {
        assert_eq!(
            SymbolKind::Class.to_lsp_symbol_kind(),
            lsp_types::SymbolKind::CLASS
        );
        assert_eq!(
            SymbolKind::EnumMember.to_lsp_symbol_kind(),
            lsp_types::SymbolKind::ENUM_MEMBER
        );
    }

    #[test]
    fn test_import_bound_name() {
        let import = ImportStatement {
            fqn: "App\\Service\\Foo".to_string(),
            alias: None,
            kind: ImportKind::Class,
            span: Span::zero(),
            source_file: String::new(),
        };
        assert_eq!(import.bound_name(), "Foo");

        let aliased = ImportStatement {
            alias: Some("F".to_string()),
            ..import
        };
        assert_eq!(aliased.bound_name(), "F");
    }
}

//! Symbol and reference extraction.
//!
//! Walks a compiled document — the template tree and every embedded PHP
//! expression sub-tree — through a node-kind → visitor dispatch table,
//! committing symbols and references into the space's tables as it goes.
//! Declarations drain matching pending references immediately, so forward
//! references resolve without a second pass over the file.

use crate::reference_table::ReferenceTable;
use crate::resolver::NamespaceResolver;
use crate::symbol_table::SymbolTable;
use blade_lsp_parser::ast::{Language, Node as TemplateNode, Tree};
use blade_lsp_parser::php::ExpressionAst;
use blade_lsp_types::{
    FileAnalysis, ImportKind, ImportStatement, Reference, ReferenceId, Span, Symbol, SymbolId,
    SymbolKind, SymbolModifiers, Visibility,
};
use std::collections::HashMap;
use tree_sitter::Node;

/// Names that are PHP built-in types or special names, never references.
const BUILTIN_TYPE_NAMES: &[&str] = &[
    "self", "static", "parent", "int", "float", "string", "bool", "array", "object", "null",
    "void", "never", "mixed", "callable", "iterable", "true", "false", "resource",
];

/// One compiled document handed to the analyzer.
pub enum Document<'a> {
    /// A parsed template; embedded PHP sub-trees are walked through the
    /// same visitors as whole PHP files.
    Template(&'a Tree),
    /// A whole PHP file parsed by the external PHP parser.
    Php(&'a ExpressionAst),
}

/// Whole-file analysis state threaded through the visitors.
struct AnalyzeCtx<'a> {
    uri: &'a str,
    resolver: &'a mut NamespaceResolver,
    symbols: &'a mut SymbolTable,
    references: &'a mut ReferenceTable,
    stubs: Option<&'a SymbolTable>,
    containers: Vec<Container>,
    current_member: Option<Member>,
    output: FileAnalysis,
}

struct Container {
    name: String,
    kind: SymbolKind,
    node_id: usize,
    symbol_id: Option<SymbolId>,
}

struct Member {
    name: String,
    node_id: usize,
}

impl<'a> AnalyzeCtx<'a> {
    /// Serialized scope path: namespace plus container names.
    fn scope(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let namespace = self.resolver.namespace();
        if !namespace.is_empty() {
            parts.push(namespace);
        }
        for container in &self.containers {
            parts.push(&container.name);
        }
        parts.join("\\")
    }

    /// Scope with the member discriminator suffix, for parameters.
    fn member_scope(&self) -> String {
        match &self.current_member {
            Some(member) => format!("{}::{}", self.scope(), member.name),
            None => self.scope(),
        }
    }

    fn in_class_like(&self) -> bool {
        matches!(
            self.containers.last().map(|c| c.kind),
            Some(
                SymbolKind::Class | SymbolKind::Interface | SymbolKind::Trait | SymbolKind::Enum
            )
        )
    }

    /// Register a symbol and immediately resolve any pending references
    /// whose fully qualified name matches it.
    fn add_symbol(&mut self, mut symbol: Symbol) -> Option<SymbolId> {
        symbol.source_file = self.uri.to_string();
        if symbol.span == Span::zero() {
            tracing::warn!(name = %symbol.name, uri = %self.uri, "symbol has no location, keeping zero sentinel");
        }
        let id = self.symbols.add_symbol(symbol)?;
        let fqn = self.symbols.get(id).map(Symbol::fqn).unwrap_or_default();
        for pending in self.references.take_pending(&fqn) {
            self.references.link(pending, self.symbols, id);
        }
        if let Some(symbol) = self.symbols.get(id) {
            self.output.symbols.push(symbol.clone());
        }
        Some(id)
    }

    fn lookup(&self, fqn: &str) -> Option<(SymbolId, bool)> {
        if let Some(symbol) = self.symbols.find_by_fully_qualified_name(fqn).first() {
            return symbol.id.map(|id| (id, false));
        }
        if let Some(stubs) = self.stubs {
            if let Some(symbol) = stubs.find_by_fully_qualified_name(fqn).first() {
                return symbol.id.map(|id| (id, true));
            }
        }
        None
    }

    /// Resolve a written name through the resolver, then commit the
    /// reference: linked when the target is already indexed (project scope
    /// first, stub fallback last), pending otherwise. Returns the resolved
    /// target when linked.
    fn add_reference(&mut self, name: &str, kind: SymbolKind, span: Span) -> Option<SymbolId> {
        let import_kind = match kind {
            SymbolKind::Function => ImportKind::Function,
            SymbolKind::Constant => ImportKind::Constant,
            _ => ImportKind::Class,
        };
        let resolution = self.resolver.resolve_from_import(name, import_kind);

        let mut reference = Reference::new(name, kind, span);
        reference.fully_qualified_name = resolution.fqn;
        reference.is_global = resolution.is_global;

        let mut target = self.lookup(&reference.fully_qualified_name);
        if target.is_none() && !resolution.aliased && import_kind != ImportKind::Class {
            // PHP falls back to the global namespace for functions and
            // constants.
            let global = NamespaceResolver::global_name(name);
            if let Some(found) = self.lookup(global) {
                reference.fully_qualified_name = global.to_string();
                reference.is_global = true;
                target = Some(found);
            }
        }

        self.commit_reference(reference, target)
    }

    fn commit_reference(
        &mut self,
        mut reference: Reference,
        target: Option<(SymbolId, bool)>,
    ) -> Option<SymbolId> {
        reference.source_file = self.uri.to_string();
        let resolved = match target {
            Some((symbol_id, is_stub)) => {
                reference.resolved_symbol_id = Some(symbol_id);
                let id = self.references.add_reference(reference);
                if !is_stub {
                    // Bidirectional link; the read-only stub table is never
                    // written to.
                    if let Some(symbol) = self.symbols.get_mut(symbol_id) {
                        if !symbol.reference_ids.contains(&id) {
                            symbol.reference_ids.push(id);
                        }
                    }
                }
                self.push_reference_output(id);
                Some(symbol_id)
            }
            None => {
                let id = self.references.add_reference(reference);
                self.push_reference_output(id);
                None
            }
        };
        resolved
    }

    fn push_reference_output(&mut self, id: ReferenceId) {
        if let Some(reference) = self.references.get(id) {
            self.output.references.push(reference.clone());
        }
    }

    /// Register an import: alias for the rest of the file, plus a reference
    /// to the imported name.
    fn add_import(&mut self, mut import: ImportStatement) {
        import.source_file = self.uri.to_string();
        self.resolver.add_import(&import);

        let kind = match import.kind {
            ImportKind::Class => SymbolKind::Class,
            ImportKind::Function => SymbolKind::Function,
            ImportKind::Constant => SymbolKind::Constant,
        };
        let mut reference = Reference::new(import.bound_name(), kind, import.span);
        reference.fully_qualified_name = import.fqn.clone();
        reference.is_global = true;
        let target = self.lookup(&import.fqn);
        self.commit_reference(reference, target);

        self.output.import_statements.push(import);
    }

    /// Record a relation (extends/implements/uses) on the innermost
    /// container symbol.
    fn relate_container_to(&mut self, target: SymbolId) {
        if let Some(id) = self.containers.last().and_then(|c| c.symbol_id) {
            if let Some(symbol) = self.symbols.get_mut(id) {
                if !symbol.related_ids.contains(&target) {
                    symbol.related_ids.push(target);
                }
            }
        }
    }
}

/// Visitor over one PHP node kind. `visit_symbol` runs before
/// `visit_reference` on every node; traversal descends into children only
/// when both passes allow it. `leave` fires after the children.
trait PhpVisitor: Send + Sync {
    fn visit_symbol(&self, _ctx: &mut AnalyzeCtx<'_>, _ast: &ExpressionAst, _node: Node<'_>) -> bool {
        true
    }
    fn visit_reference(
        &self,
        _ctx: &mut AnalyzeCtx<'_>,
        _ast: &ExpressionAst,
        _node: Node<'_>,
    ) -> bool {
        true
    }
    fn leave(&self, _ctx: &mut AnalyzeCtx<'_>, _ast: &ExpressionAst, _node: Node<'_>) {}
}

/// Analyzer with its node-kind dispatch table. One instance is reusable
/// across files and documents.
pub struct Analyzer {
    registry: HashMap<&'static str, Box<dyn PhpVisitor>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let mut registry: HashMap<&'static str, Box<dyn PhpVisitor>> = HashMap::new();
        registry.insert("namespace_definition", Box::new(NamespaceVisitor));
        registry.insert("namespace_use_declaration", Box::new(UseVisitor));
        registry.insert(
            "class_declaration",
            Box::new(ClassLikeVisitor {
                kind: SymbolKind::Class,
            }),
        );
        registry.insert(
            "interface_declaration",
            Box::new(ClassLikeVisitor {
                kind: SymbolKind::Interface,
            }),
        );
        registry.insert(
            "trait_declaration",
            Box::new(ClassLikeVisitor {
                kind: SymbolKind::Trait,
            }),
        );
        registry.insert(
            "enum_declaration",
            Box::new(ClassLikeVisitor {
                kind: SymbolKind::Enum,
            }),
        );
        registry.insert("enum_case", Box::new(EnumCaseVisitor));
        registry.insert("function_definition", Box::new(FunctionVisitor));
        registry.insert("method_declaration", Box::new(MethodVisitor));
        registry.insert("property_declaration", Box::new(PropertyVisitor));
        registry.insert("const_declaration", Box::new(ConstVisitor));
        registry.insert("simple_parameter", Box::new(ParameterVisitor));
        registry.insert("property_promotion_parameter", Box::new(ParameterVisitor));
        registry.insert("variadic_parameter", Box::new(ParameterVisitor));
        registry.insert(
            "base_clause",
            Box::new(InheritanceVisitor {
                ref_kind: SymbolKind::Class,
            }),
        );
        registry.insert(
            "class_interface_clause",
            Box::new(InheritanceVisitor {
                ref_kind: SymbolKind::Interface,
            }),
        );
        registry.insert("named_type", Box::new(TypeHintVisitor));
        registry.insert("use_declaration", Box::new(TraitUseVisitor));
        Analyzer { registry }
    }

    /// Analyze one compiled document, committing symbols/references/imports
    /// into the given tables and returning the per-file extraction.
    #[allow(clippy::too_many_arguments)]
    pub fn analyze(
        &self,
        uri: &str,
        document: Document<'_>,
        resolver: &mut NamespaceResolver,
        symbols: &mut SymbolTable,
        references: &mut ReferenceTable,
        stubs: Option<&SymbolTable>,
    ) -> FileAnalysis {
        resolver.begin_file();
        let mut ctx = AnalyzeCtx {
            uri,
            resolver,
            symbols,
            references,
            stubs,
            containers: Vec::new(),
            current_member: None,
            output: FileAnalysis::default(),
        };
        match document {
            Document::Php(ast) => self.walk_php(&mut ctx, ast, ast.root()),
            Document::Template(tree) => {
                for child in &tree.children {
                    self.walk_template(&mut ctx, child);
                }
            }
        }
        ctx.output
    }

    fn walk_php(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) {
        let kind = node.kind();
        let descend = match self.registry.get(kind) {
            Some(visitor) => {
                let symbols = visitor.visit_symbol(ctx, ast, node);
                let references = visitor.visit_reference(ctx, ast, node);
                symbols && references
            }
            None => true,
        };
        if descend {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                self.walk_php(ctx, ast, child);
            }
        }
        if let Some(visitor) = self.registry.get(kind) {
            visitor.leave(ctx, ast, node);
        }
    }

    fn walk_template(&self, ctx: &mut AnalyzeCtx<'_>, node: &TemplateNode) {
        match node {
            TemplateNode::Element(element) => {
                for attribute in &element.attributes {
                    self.walk_template(ctx, attribute);
                }
                for child in &element.children {
                    self.walk_template(ctx, child);
                }
            }
            TemplateNode::Attribute(attribute) => {
                if let Some(value) = &attribute.value {
                    for part in &value.parts {
                        self.walk_template(ctx, part);
                    }
                }
            }
            TemplateNode::Directive(directive) => {
                if let Some(ast) = directive.params.as_ref().and_then(|p| p.expression.as_ref()) {
                    self.walk_php(ctx, ast, ast.root());
                }
                for child in &directive.children {
                    self.walk_template(ctx, child);
                }
            }
            TemplateNode::Echo(echo) => {
                if let Some(ast) = &echo.expression {
                    self.walk_php(ctx, ast, ast.root());
                }
            }
            TemplateNode::EmbeddedRegion(region) => {
                if region.language == Language::Php {
                    if let Some(ast) = &region.expression {
                        self.walk_php(ctx, ast, ast.root());
                    }
                }
            }
            TemplateNode::Comment(_) | TemplateNode::Text(_) | TemplateNode::Error(_) => {}
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

// --- Shared extraction helpers ---

fn name_of<'t>(ast: &'t ExpressionAst, node: Node<'t>) -> Option<(String, Span)> {
    let name_node = node.child_by_field_name("name")?;
    Some((
        ast.text(name_node).trim_start_matches('$').to_string(),
        ast.host_span(name_node),
    ))
}

fn extract_modifiers(ast: &ExpressionAst, node: Node<'_>) -> SymbolModifiers {
    let mut modifiers = SymbolModifiers::default();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "visibility_modifier" => {
                modifiers.visibility = match ast.text(child) {
                    "protected" => Visibility::Protected,
                    "private" => Visibility::Private,
                    _ => Visibility::Public,
                };
            }
            "static_modifier" => modifiers.is_static = true,
            "abstract_modifier" => modifiers.is_abstract = true,
            "final_modifier" => modifiers.is_final = true,
            "readonly_modifier" => modifiers.is_readonly = true,
            _ => {}
        }
    }
    modifiers
}

fn declared_type(ast: &ExpressionAst, node: Node<'_>, field: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|t| ast.text(t).to_string())
}

/// The assigned value of a const element or enum case. The grammar does not
/// name the value field on every node, so fall back to the last named child
/// after the name.
fn value_of(ast: &ExpressionAst, node: Node<'_>) -> Option<String> {
    let value = node.child_by_field_name("value").or_else(|| {
        let count = node.named_child_count();
        if count > 1 {
            node.named_child(count - 1)
        } else {
            None
        }
    })?;
    if value.kind() == "name" {
        return None;
    }
    Some(ast.text(value).to_string())
}

// --- Visitors ---

struct NamespaceVisitor;

impl PhpVisitor for NamespaceVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let mut cursor = node.walk();
        let name_node = node
            .children(&mut cursor)
            .find(|c| c.kind() == "namespace_name");
        let Some(name_node) = name_node else {
            return true;
        };
        let name = ast.text(name_node).to_string();

        // A namespace declaration nested under open containers means the
        // scope stack drifted (broken input); repair it.
        if !ctx.containers.is_empty() {
            tracing::warn!(uri = %ctx.uri, "namespace inside open container, repairing scope stack");
            ctx.containers.clear();
            ctx.current_member = None;
        }

        let mut symbol = Symbol::new(name.clone(), SymbolKind::Namespace, ast.host_span(node));
        symbol.scope = String::new();
        ctx.add_symbol(symbol);
        ctx.resolver.set_namespace(&name);
        true
    }
}

struct UseVisitor;

impl UseVisitor {
    fn import_kind(ast: &ExpressionAst, node: Node<'_>) -> ImportKind {
        let text = ast.text(node);
        if text.starts_with("use function") {
            ImportKind::Function
        } else if text.starts_with("use const") {
            ImportKind::Constant
        } else {
            ImportKind::Class
        }
    }

    fn extract_clause(
        ctx: &mut AnalyzeCtx<'_>,
        ast: &ExpressionAst,
        clause: Node<'_>,
        prefix: &str,
        kind: ImportKind,
    ) {
        let mut fqn: Option<String> = None;
        let mut alias: Option<String> = None;
        let mut saw_as = false;
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                "qualified_name" | "namespace_name" | "name" if !saw_as => {
                    fqn = Some(ast.text(child).to_string());
                }
                "as" => saw_as = true,
                "name" if saw_as => alias = Some(ast.text(child).to_string()),
                _ => {}
            }
        }
        let Some(fqn) = fqn else { return };
        let fqn = if prefix.is_empty() {
            fqn
        } else {
            format!("{}\\{}", prefix, fqn)
        };
        ctx.add_import(ImportStatement {
            fqn,
            alias,
            kind,
            span: ast.host_span(clause),
            source_file: String::new(),
        });
    }
}

impl PhpVisitor for UseVisitor {
    fn visit_reference(
        &self,
        ctx: &mut AnalyzeCtx<'_>,
        ast: &ExpressionAst,
        node: Node<'_>,
    ) -> bool {
        let kind = Self::import_kind(ast, node);
        // Group form: `use App\Models\{User, Post};` keeps the shared
        // prefix as a namespace_name child of the declaration.
        let prefix = node
            .child_by_field_name("prefix")
            .or_else(|| {
                let mut cursor = node.walk();
                let found = node
                    .children(&mut cursor)
                    .find(|child| child.kind() == "namespace_name");
                found
            })
            .map(|p| ast.text(p).to_string())
            .unwrap_or_default();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "namespace_use_clause" => {
                    Self::extract_clause(ctx, ast, child, &prefix, kind);
                }
                "namespace_use_group" => {
                    let mut group_cursor = child.walk();
                    for clause in child.children(&mut group_cursor) {
                        if clause.kind() == "namespace_use_clause" {
                            Self::extract_clause(ctx, ast, clause, &prefix, kind);
                        }
                    }
                }
                _ => {}
            }
        }
        false
    }
}

struct ClassLikeVisitor {
    kind: SymbolKind,
}

impl PhpVisitor for ClassLikeVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let Some((name, _)) = name_of(ast, node) else {
            return true;
        };
        let mut symbol = Symbol::new(name.clone(), self.kind, ast.host_span(node));
        symbol.scope = ctx.scope();
        symbol.modifiers = extract_modifiers(ast, node);
        let symbol_id = ctx.add_symbol(symbol);
        ctx.containers.push(Container {
            name,
            kind: self.kind,
            node_id: node.id(),
            symbol_id,
        });
        true
    }

    fn leave(&self, ctx: &mut AnalyzeCtx<'_>, _ast: &ExpressionAst, node: Node<'_>) {
        if ctx
            .containers
            .last()
            .is_some_and(|c| c.node_id == node.id())
        {
            ctx.containers.pop();
        }
    }
}

struct FunctionVisitor;

impl PhpVisitor for FunctionVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let Some((name, _)) = name_of(ast, node) else {
            return true;
        };
        let mut symbol = Symbol::new(name.clone(), SymbolKind::Function, ast.host_span(node));
        symbol.scope = ctx.scope();
        symbol.types.declared = declared_type(ast, node, "return_type");
        let symbol_id = ctx.add_symbol(symbol);
        ctx.containers.push(Container {
            name,
            kind: SymbolKind::Function,
            node_id: node.id(),
            symbol_id,
        });
        true
    }

    fn leave(&self, ctx: &mut AnalyzeCtx<'_>, _ast: &ExpressionAst, node: Node<'_>) {
        if ctx
            .containers
            .last()
            .is_some_and(|c| c.node_id == node.id())
        {
            ctx.containers.pop();
        }
    }
}

struct MethodVisitor;

impl PhpVisitor for MethodVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let Some((name, _)) = name_of(ast, node) else {
            return true;
        };
        let mut symbol = Symbol::new(name.clone(), SymbolKind::Method, ast.host_span(node));
        symbol.scope = ctx.scope();
        symbol.modifiers = extract_modifiers(ast, node);
        symbol.types.declared = declared_type(ast, node, "return_type");
        ctx.add_symbol(symbol);
        ctx.current_member = Some(Member {
            name,
            node_id: node.id(),
        });
        true
    }

    fn leave(&self, ctx: &mut AnalyzeCtx<'_>, _ast: &ExpressionAst, node: Node<'_>) {
        if ctx
            .current_member
            .as_ref()
            .is_some_and(|m| m.node_id == node.id())
        {
            ctx.current_member = None;
        }
    }
}

struct PropertyVisitor;

impl PhpVisitor for PropertyVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let modifiers = extract_modifiers(ast, node);
        let declared = declared_type(ast, node, "type");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "property_element" {
                continue;
            }
            let Some((name, _)) = name_of(ast, child) else {
                continue;
            };
            let mut symbol = Symbol::new(name, SymbolKind::Property, ast.host_span(child));
            symbol.scope = ctx.scope();
            symbol.modifiers = modifiers;
            symbol.types.declared = declared.clone();
            ctx.add_symbol(symbol);
        }
        true
    }
}

struct ConstVisitor;

impl PhpVisitor for ConstVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let kind = if ctx.in_class_like() {
            SymbolKind::ClassConstant
        } else {
            SymbolKind::Constant
        };
        let modifiers = extract_modifiers(ast, node);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "const_element" {
                continue;
            }
            let name_node = child.child_by_field_name("name").or_else(|| {
                (0..child.child_count())
                    .filter_map(|i| child.child(i))
                    .find(|c| c.kind() == "name")
            });
            let Some(name_node) = name_node else { continue };
            let mut symbol = Symbol::new(
                ast.text(name_node).to_string(),
                kind,
                ast.host_span(child),
            );
            symbol.scope = ctx.scope();
            symbol.modifiers = modifiers;
            symbol.value = value_of(ast, child);
            ctx.add_symbol(symbol);
        }
        true
    }
}

struct EnumCaseVisitor;

impl PhpVisitor for EnumCaseVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let Some((name, _)) = name_of(ast, node) else {
            return true;
        };
        let mut symbol = Symbol::new(name, SymbolKind::EnumMember, ast.host_span(node));
        symbol.scope = ctx.scope();
        symbol.value = value_of(ast, node);
        ctx.add_symbol(symbol);
        true
    }
}

struct ParameterVisitor;

impl PhpVisitor for ParameterVisitor {
    fn visit_symbol(&self, ctx: &mut AnalyzeCtx<'_>, ast: &ExpressionAst, node: Node<'_>) -> bool {
        let Some((name, _)) = name_of(ast, node) else {
            return true;
        };
        let mut symbol = Symbol::new(name, SymbolKind::Parameter, ast.host_span(node));
        symbol.scope = ctx.member_scope();
        symbol.types.declared = declared_type(ast, node, "type");
        symbol.value = node
            .child_by_field_name("default_value")
            .map(|v| ast.text(v).to_string());
        ctx.add_symbol(symbol);
        true
    }
}

struct InheritanceVisitor {
    ref_kind: SymbolKind,
}

impl PhpVisitor for InheritanceVisitor {
    fn visit_reference(
        &self,
        ctx: &mut AnalyzeCtx<'_>,
        ast: &ExpressionAst,
        node: Node<'_>,
    ) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "name" | "qualified_name") {
                let name = ast.text(child).to_string();
                let target =
                    ctx.add_reference(&name, self.ref_kind, ast.host_span(child));
                if let Some(target) = target {
                    ctx.relate_container_to(target);
                }
            }
        }
        false
    }
}

struct TypeHintVisitor;

impl PhpVisitor for TypeHintVisitor {
    fn visit_reference(
        &self,
        ctx: &mut AnalyzeCtx<'_>,
        ast: &ExpressionAst,
        node: Node<'_>,
    ) -> bool {
        let inner = if node.named_child_count() > 0 {
            node.named_child(0)
        } else {
            Some(node)
        };
        let Some(inner) = inner else { return false };
        if !matches!(inner.kind(), "name" | "qualified_name" | "named_type") {
            return false;
        }
        let name = ast.text(inner).to_string();
        if BUILTIN_TYPE_NAMES.contains(&name.to_lowercase().as_str()) {
            return false;
        }
        ctx.add_reference(&name, SymbolKind::Class, ast.host_span(inner));
        false
    }
}

struct TraitUseVisitor;

impl PhpVisitor for TraitUseVisitor {
    fn visit_reference(
        &self,
        ctx: &mut AnalyzeCtx<'_>,
        ast: &ExpressionAst,
        node: Node<'_>,
    ) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "name" | "qualified_name") {
                let name = ast.text(child).to_string();
                let target = ctx.add_reference(&name, SymbolKind::Trait, ast.host_span(child));
                if let Some(target) = target {
                    ctx.relate_container_to(target);
                }
            }
        }
        false
    }
}

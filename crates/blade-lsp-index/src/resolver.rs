//! Namespace and import-alias resolution.
//!
//! Holds the PSR-4 autoload table for the space and a per-file alias table
//! fed by `use` declarations. Resolution order is: explicit alias, then the
//! current namespace-qualified name; the global/stub fallback is tried by
//! the analyzer, not here.

use crate::composer::{parse_autoload, NamespaceMap};
use blade_lsp_types::{ImportKind, ImportStatement};
use std::collections::HashMap;
use std::path::Path;

/// Outcome of resolving a written name to a fully qualified one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub fqn: String,
    /// Whether the name addressed the global namespace (leading `\`, or no
    /// namespace in effect).
    pub is_global: bool,
    /// Whether an import alias matched.
    pub aliased: bool,
}

/// Per-space resolver. The alias table and namespace are per-file state,
/// cleared by [`begin_file`](NamespaceResolver::begin_file).
#[derive(Debug, Default)]
pub struct NamespaceResolver {
    autoload: NamespaceMap,
    imports: HashMap<String, (String, ImportKind)>,
    current_namespace: String,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        NamespaceResolver::default()
    }

    /// Parse autoload metadata out of manifest text. The resulting mapping
    /// is exposed for path heuristics only.
    pub fn load_autoload(&mut self, manifest: &str, base_dir: &Path) -> Result<(), String> {
        self.autoload = parse_autoload(manifest, base_dir)?;
        tracing::debug!(prefixes = self.autoload.psr4.len(), "loaded PSR-4 autoload mapping");
        Ok(())
    }

    pub fn autoload(&self) -> &NamespaceMap {
        &self.autoload
    }

    /// Reset per-file state at the start of a file's analysis.
    pub fn begin_file(&mut self) {
        self.imports.clear();
        self.current_namespace.clear();
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        self.current_namespace = namespace.to_string();
    }

    pub fn namespace(&self) -> &str {
        &self.current_namespace
    }

    /// Register `alias → fully-qualified-name` for the rest of the file.
    pub fn add_import(&mut self, import: &ImportStatement) {
        self.imports.insert(
            import.bound_name().to_string(),
            (import.fqn.clone(), import.kind),
        );
    }

    /// Resolve a written name. If the leading segment matches a registered
    /// alias it is substituted and the remaining segments re-joined;
    /// otherwise the name is returned relative to the current namespace.
    pub fn resolve_from_import(&self, name: &str, kind: ImportKind) -> Resolution {
        if let Some(stripped) = name.strip_prefix('\\') {
            return Resolution {
                fqn: stripped.to_string(),
                is_global: true,
                aliased: false,
            };
        }

        let mut segments = name.split('\\');
        let first = segments.next().unwrap_or(name);
        if let Some((fqn, import_kind)) = self.imports.get(first) {
            if *import_kind == kind || kind == ImportKind::Class {
                let rest: Vec<&str> = segments.collect();
                let fqn = if rest.is_empty() {
                    fqn.clone()
                } else {
                    format!("{}\\{}", fqn, rest.join("\\"))
                };
                return Resolution {
                    fqn,
                    is_global: false,
                    aliased: true,
                };
            }
        }

        if self.current_namespace.is_empty() {
            Resolution {
                fqn: name.to_string(),
                is_global: true,
                aliased: false,
            }
        } else {
            Resolution {
                fqn: format!("{}\\{}", self.current_namespace, name),
                is_global: false,
                aliased: false,
            }
        }
    }

    /// The global-namespace form of a name, the analyzer's last lookup
    /// before a reference goes pending (PHP falls back to global functions
    /// and constants).
    pub fn global_name(name: &str) -> &str {
        name.trim_start_matches('\\')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blade_lsp_types::Span;

    fn import(fqn: &str, alias: Option<&str>, kind: ImportKind) -> ImportStatement {
        ImportStatement {
            fqn: fqn.to_string(),
            alias: alias.map(str::to_string),
            kind,
            span: Span::zero(),
            source_file: String::new(),
        }
    }

    #[test]
    fn test_resolve_via_import() {
        let mut resolver = NamespaceResolver::new();
        resolver.set_namespace("App\\Http");
        resolver.add_import(&import("App\\Service\\UserService", None, ImportKind::Class));

        let resolution = resolver.resolve_from_import("UserService", ImportKind::Class);
        assert_eq!(resolution.fqn, "App\\Service\\UserService");
        assert!(resolution.aliased);
    }

    #[test]
    fn test_resolve_via_alias() {
        let mut resolver = NamespaceResolver::new();
        resolver.add_import(&import("App\\Entity\\Bar", Some("B"), ImportKind::Class));
        let resolution = resolver.resolve_from_import("B", ImportKind::Class);
        assert_eq!(resolution.fqn, "App\\Entity\\Bar");
    }

    #[test]
    fn test_partial_alias_match_rejoins_segments() {
        // use App\Foo; then Foo\Bar → App\Foo\Bar
        let mut resolver = NamespaceResolver::new();
        resolver.add_import(&import("App\\Foo", None, ImportKind::Class));
        let resolution = resolver.resolve_from_import("Foo\\Bar", ImportKind::Class);
        assert_eq!(resolution.fqn, "App\\Foo\\Bar");
    }

    #[test]
    fn test_unaliased_name_is_namespace_relative() {
        let mut resolver = NamespaceResolver::new();
        resolver.set_namespace("App");
        let resolution = resolver.resolve_from_import("Helper", ImportKind::Class);
        assert_eq!(resolution.fqn, "App\\Helper");
        assert!(!resolution.is_global);
        assert!(!resolution.aliased);
    }

    #[test]
    fn test_leading_backslash_is_global() {
        let resolver = NamespaceResolver::new();
        let resolution = resolver.resolve_from_import("\\DateTime", ImportKind::Class);
        assert_eq!(resolution.fqn, "DateTime");
        assert!(resolution.is_global);
    }

    #[test]
    fn test_no_namespace_means_global() {
        let resolver = NamespaceResolver::new();
        let resolution = resolver.resolve_from_import("strlen", ImportKind::Function);
        assert_eq!(resolution.fqn, "strlen");
        assert!(resolution.is_global);
    }

    #[test]
    fn test_begin_file_clears_aliases_and_namespace() {
        let mut resolver = NamespaceResolver::new();
        resolver.set_namespace("App");
        resolver.add_import(&import("App\\Foo", None, ImportKind::Class));
        resolver.begin_file();
        let resolution = resolver.resolve_from_import("Foo", ImportKind::Class);
        assert_eq!(resolution.fqn, "Foo");
        assert!(resolution.is_global);
    }

    #[test]
    fn test_function_alias_requires_function_kind() {
        let mut resolver = NamespaceResolver::new();
        resolver.set_namespace("App");
        resolver.add_import(&import("App\\Support\\helper", None, ImportKind::Function));
        let as_function = resolver.resolve_from_import("helper", ImportKind::Function);
        assert_eq!(as_function.fqn, "App\\Support\\helper");
        let as_constant = resolver.resolve_from_import("helper", ImportKind::Constant);
        assert_eq!(as_constant.fqn, "App\\helper");
    }

    #[test]
    fn test_load_autoload() {
        let mut resolver = NamespaceResolver::new();
        resolver
            .load_autoload(
                r#"{"autoload": {"psr-4": {"App\\": "src/"}}}"#,
                Path::new("/p"),
            )
            .unwrap();
        assert_eq!(resolver.autoload().psr4.len(), 1);
    }
}

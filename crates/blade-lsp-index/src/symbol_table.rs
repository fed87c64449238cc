//! Id-indexed symbol storage with secondary indexes.
//!
//! Symbols live in an arena keyed by id; secondary indexes map source file,
//! scope string, fully qualified name and name prefix back to ids. Deleting
//! a source file's symbols removes them from every index atomically.

use crate::trie::NameTrie;
use blade_lsp_types::{Symbol, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Symbol table for one project space.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: HashMap<SymbolId, Symbol>,
    next_id: u64,
    source_file_index: HashMap<String, Vec<SymbolId>>,
    scope_index: HashMap<String, Vec<SymbolId>>,
    fqn_index: HashMap<String, Vec<SymbolId>>,
    name_trie: NameTrie,
}

/// Serializable snapshot: the arena plus the file and scope indexes. The
/// trie and FQN index are rebuilt on load.
#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolTableSnapshot {
    pub symbols: Vec<(SymbolId, Symbol)>,
    pub source_file_index: HashMap<String, Vec<SymbolId>>,
    pub scope_index: HashMap<String, Vec<SymbolId>>,
    pub next_id: u64,
}

impl SymbolTable {
    /// Ids are assigned from 1; 0 is never a valid id.
    pub fn new() -> Self {
        SymbolTable {
            symbols: HashMap::new(),
            next_id: 1,
            source_file_index: HashMap::new(),
            scope_index: HashMap::new(),
            fqn_index: HashMap::new(),
            name_trie: NameTrie::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Insert a symbol, assigning the next id when it has none. A symbol
    /// arriving with an id that already exists is rejected and logged.
    pub fn add_symbol(&mut self, mut symbol: Symbol) -> Option<SymbolId> {
        let id = match symbol.id {
            Some(id) => {
                if self.symbols.contains_key(&id) {
                    tracing::warn!(%id, name = %symbol.name, "rejected symbol with duplicate id");
                    return None;
                }
                self.next_id = self.next_id.max(id.0 + 1);
                id
            }
            None => {
                let id = SymbolId(self.next_id);
                self.next_id += 1;
                symbol.id = Some(id);
                id
            }
        };

        self.source_file_index
            .entry(symbol.source_file.clone())
            .or_default()
            .push(id);
        self.scope_index
            .entry(symbol.scope.clone())
            .or_default()
            .push(id);
        self.fqn_index.entry(symbol.fqn()).or_default().push(id);
        self.name_trie.insert(&symbol.name, id);
        self.symbols.insert(id, symbol);
        Some(id)
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// All symbols whose name starts with `prefix` (case-insensitive).
    pub fn find_by_name_prefix(&self, prefix: &str) -> Vec<&Symbol> {
        self.name_trie
            .find_prefix(prefix)
            .into_iter()
            .filter_map(|id| self.symbols.get(&id))
            .collect()
    }

    pub fn find_by_fully_qualified_name(&self, fqn: &str) -> Vec<&Symbol> {
        self.fqn_index
            .get(fqn)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn find_by_scope(&self, scope: &str) -> Vec<&Symbol> {
        self.scope_index
            .get(scope)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn find_by_source_file(&self, source_file: &str) -> Vec<&Symbol> {
        self.source_file_index
            .get(source_file)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).collect())
            .unwrap_or_default()
    }

    /// The symbol in `source_file` whose span contains `offset`, restricted
    /// to spans that start or end on the queried line, tie-broken by the
    /// smallest distance to either span boundary. Used for hover/definition
    /// at a cursor.
    pub fn find_nearest_by_offset(
        &self,
        source_file: &str,
        line: u32,
        offset: usize,
    ) -> Option<&Symbol> {
        let ids = self.source_file_index.get(source_file)?;
        ids.iter()
            .filter_map(|id| self.symbols.get(id))
            .filter(|s| s.span.contains_offset(offset))
            .filter(|s| s.span.start.line == line || s.span.end.line == line)
            .min_by_key(|s| {
                let to_start = offset - s.span.start.offset;
                let to_end = s.span.end.offset - offset;
                to_start.min(to_end)
            })
    }

    /// Remove every trace of a source file's symbols from the arena and all
    /// four indexes. Returns the removed symbols (used by the reference
    /// table to return dependent references to pending).
    pub fn delete_by_source_file(&mut self, source_file: &str) -> Vec<Symbol> {
        let ids = match self.source_file_index.remove(source_file) {
            Some(ids) => ids,
            None => return Vec::new(),
        };

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(symbol) = self.symbols.remove(&id) else {
                continue;
            };
            if let Some(scope_ids) = self.scope_index.get_mut(&symbol.scope) {
                scope_ids.retain(|existing| *existing != id);
                if scope_ids.is_empty() {
                    self.scope_index.remove(&symbol.scope);
                }
            }
            let fqn = symbol.fqn();
            if let Some(fqn_ids) = self.fqn_index.get_mut(&fqn) {
                fqn_ids.retain(|existing| *existing != id);
                if fqn_ids.is_empty() {
                    self.fqn_index.remove(&fqn);
                }
            }
            self.name_trie.remove(&symbol.name, id);
            removed.push(symbol);
        }
        removed
    }

    // --- Persistence ---

    /// Snapshot for on-disk caching; reloadable without re-parsing.
    pub fn save(&self) -> SymbolTableSnapshot {
        let mut symbols: Vec<(SymbolId, Symbol)> =
            self.symbols.iter().map(|(id, s)| (*id, s.clone())).collect();
        symbols.sort_by_key(|(id, _)| *id);
        SymbolTableSnapshot {
            symbols,
            source_file_index: self.source_file_index.clone(),
            scope_index: self.scope_index.clone(),
            next_id: self.next_id,
        }
    }

    /// Rebuild a table from a snapshot. The trie and FQN index are derived
    /// from the symbol arena.
    pub fn load(snapshot: SymbolTableSnapshot) -> Self {
        let mut table = SymbolTable {
            next_id: snapshot.next_id.max(1),
            source_file_index: snapshot.source_file_index,
            scope_index: snapshot.scope_index,
            ..SymbolTable::new()
        };
        for (id, symbol) in snapshot.symbols {
            table.fqn_index.entry(symbol.fqn()).or_default().push(id);
            table.name_trie.insert(&symbol.name, id);
            table.symbols.insert(id, symbol);
        }
        table
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.save())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::load(serde_json::from_str(json)?))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blade_lsp_types::{Position, Span, SymbolKind};

    fn make_symbol(name: &str, kind: SymbolKind, scope: &str, file: &str) -> Symbol {
        let mut symbol = Symbol::new(name, kind, Span::zero());
        symbol.scope = scope.to_string();
        symbol.source_file = file.to_string();
        symbol
    }

    fn spanned(mut symbol: Symbol, start: (u32, usize), end: (u32, usize)) -> Symbol {
        symbol.span = Span::new(
            Position::new(start.0, 0, start.1),
            Position::new(end.0, 0, end.1),
        );
        symbol
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut table = SymbolTable::new();
        let id = table
            .add_symbol(make_symbol("Foo", SymbolKind::Class, "App", "file:///a.php"))
            .unwrap();
        assert_eq!(id, SymbolId(1));
        let second = table
            .add_symbol(make_symbol("Bar", SymbolKind::Class, "App", "file:///a.php"))
            .unwrap();
        assert_eq!(second, SymbolId(2));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut table = SymbolTable::new();
        let id = table
            .add_symbol(make_symbol("Foo", SymbolKind::Class, "App", "file:///a.php"))
            .unwrap();
        let mut dup = make_symbol("Other", SymbolKind::Class, "App", "file:///a.php");
        dup.id = Some(id);
        assert!(table.add_symbol(dup).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_by_all_indexes() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(make_symbol("Foo", SymbolKind::Class, "App", "file:///a.php"))
            .unwrap();
        table
            .add_symbol(make_symbol(
                "bar",
                SymbolKind::Method,
                "App\\Foo",
                "file:///a.php",
            ))
            .unwrap();

        assert_eq!(table.find_by_fully_qualified_name("App\\Foo").len(), 1);
        assert_eq!(table.find_by_fully_qualified_name("App\\Foo::bar").len(), 1);
        assert_eq!(table.find_by_scope("App\\Foo").len(), 1);
        assert_eq!(table.find_by_source_file("file:///a.php").len(), 2);
        assert_eq!(table.find_by_name_prefix("fo").len(), 1);
    }

    #[test]
    fn test_find_nearest_by_offset() {
        let mut table = SymbolTable::new();
        let class = spanned(
            make_symbol("Foo", SymbolKind::Class, "App", "file:///a.php"),
            (2, 20),
            (10, 200),
        );
        let method = spanned(
            make_symbol("bar", SymbolKind::Method, "App\\Foo", "file:///a.php"),
            (4, 60),
            (6, 120),
        );
        table.add_symbol(class).unwrap();
        table.add_symbol(method).unwrap();

        // Offset inside the method, on its start line: method wins (closer
        // boundary).
        let found = table
            .find_nearest_by_offset("file:///a.php", 4, 65)
            .unwrap();
        assert_eq!(found.name, "bar");

        // Line restriction: same offset but queried on the class start line
        // only matches the class span.
        let found = table
            .find_nearest_by_offset("file:///a.php", 2, 25)
            .unwrap();
        assert_eq!(found.name, "Foo");

        assert!(table
            .find_nearest_by_offset("file:///a.php", 20, 65)
            .is_none());
    }

    #[test]
    fn test_delete_by_source_file_clears_all_indexes() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(make_symbol("Foo", SymbolKind::Class, "App", "file:///a.php"))
            .unwrap();
        table
            .add_symbol(make_symbol("Bar", SymbolKind::Class, "App", "file:///b.php"))
            .unwrap();

        let removed = table.delete_by_source_file("file:///a.php");
        assert_eq!(removed.len(), 1);

        assert!(table.find_by_fully_qualified_name("App\\Foo").is_empty());
        assert!(table.find_by_source_file("file:///a.php").is_empty());
        assert!(table.find_by_name_prefix("foo").is_empty());
        assert_eq!(table.find_by_scope("App").len(), 1); // Bar survives
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(make_symbol("Foo", SymbolKind::Class, "App", "file:///a.php"))
            .unwrap();
        table
            .add_symbol(make_symbol(
                "helper",
                SymbolKind::Function,
                "App",
                "file:///b.php",
            ))
            .unwrap();

        let json = table.to_json().unwrap();
        let reloaded = SymbolTable::from_json(&json).unwrap();

        assert_eq!(
            reloaded.find_by_source_file("file:///a.php").len(),
            table.find_by_source_file("file:///a.php").len()
        );
        assert_eq!(
            reloaded.find_by_scope("App").len(),
            table.find_by_scope("App").len()
        );
        assert_eq!(
            reloaded.find_by_name_prefix("he").len(),
            table.find_by_name_prefix("he").len()
        );

        // Ids stay monotonic after load.
        let id = reloaded_next_id(reloaded);
        assert_eq!(id, SymbolId(3));
    }

    fn reloaded_next_id(mut table: SymbolTable) -> SymbolId {
        table
            .add_symbol(make_symbol(
                "Later",
                SymbolKind::Class,
                "App",
                "file:///c.php",
            ))
            .unwrap()
    }
}

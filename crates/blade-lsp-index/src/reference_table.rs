//! Reference storage with a pending backlog.
//!
//! Every committed reference is either resolved — bidirectionally linked to
//! a symbol in the same space's symbol table, or one-directionally to a
//! read-only stub symbol — or held in the pending backlog keyed by fully
//! qualified name, so a later-arriving symbol resolves it without a full
//! re-scan.

use crate::symbol_table::SymbolTable;
use blade_lsp_types::{Reference, ReferenceId, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference table for one project space.
#[derive(Debug)]
pub struct ReferenceTable {
    references: HashMap<ReferenceId, Reference>,
    next_id: u64,
    source_file_index: HashMap<String, Vec<ReferenceId>>,
    pending: HashMap<String, Vec<ReferenceId>>,
}

/// Serializable snapshot. The pending backlog is persisted so that a cache
/// reload does not silently resolve nothing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferenceTableSnapshot {
    pub references: Vec<(ReferenceId, Reference)>,
    pub source_file_index: HashMap<String, Vec<ReferenceId>>,
    pub pending: HashMap<String, Vec<ReferenceId>>,
    pub next_id: u64,
}

impl ReferenceTable {
    /// Ids are assigned from 1; 0 is never a valid id.
    pub fn new() -> Self {
        ReferenceTable {
            references: HashMap::new(),
            next_id: 1,
            source_file_index: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Insert a reference, assigning an id when it has none. Unresolved
    /// references are appended to the pending backlog under their FQN.
    pub fn add_reference(&mut self, mut reference: Reference) -> ReferenceId {
        let id = match reference.id {
            Some(id) => {
                self.next_id = self.next_id.max(id.0 + 1);
                id
            }
            None => {
                let id = ReferenceId(self.next_id);
                self.next_id += 1;
                reference.id = Some(id);
                id
            }
        };
        self.source_file_index
            .entry(reference.source_file.clone())
            .or_default()
            .push(id);
        if reference.resolved_symbol_id.is_none() {
            self.pending
                .entry(reference.fully_qualified_name.clone())
                .or_default()
                .push(id);
        }
        self.references.insert(id, reference);
        id
    }

    pub fn get(&self, id: ReferenceId) -> Option<&Reference> {
        self.references.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.values()
    }

    pub fn find_by_source_file(&self, source_file: &str) -> Vec<&Reference> {
        self.source_file_index
            .get(source_file)
            .map(|ids| ids.iter().filter_map(|id| self.references.get(id)).collect())
            .unwrap_or_default()
    }

    /// Pending reference ids recorded under `fqn`, removed from the
    /// backlog. Callers link them against the newly arrived symbol.
    pub fn take_pending(&mut self, fqn: &str) -> Vec<ReferenceId> {
        self.pending.remove(fqn).unwrap_or_default()
    }

    /// Resolve one reference against a symbol in `symbols`, maintaining the
    /// bidirectional link.
    pub fn link(&mut self, id: ReferenceId, symbols: &mut SymbolTable, symbol_id: SymbolId) {
        if let Some(reference) = self.references.get_mut(&id) {
            reference.resolved_symbol_id = Some(symbol_id);
        }
        if let Some(symbol) = symbols.get_mut(symbol_id) {
            if !symbol.reference_ids.contains(&id) {
                symbol.reference_ids.push(id);
            }
        }
    }

    /// Resolve one reference against a read-only stub symbol. The stub
    /// table is never mutated, so this link is one-directional.
    pub fn link_stub(&mut self, id: ReferenceId, symbol_id: SymbolId) {
        if let Some(reference) = self.references.get_mut(&id) {
            reference.resolved_symbol_id = Some(symbol_id);
        }
    }

    /// Re-attempt resolution for the whole pending backlog against the
    /// space's symbols, falling back to the read-only stub table. Entries
    /// that still do not resolve stay pending. Returns how many resolved.
    pub fn link_pending_references(
        &mut self,
        symbols: &mut SymbolTable,
        stubs: Option<&SymbolTable>,
    ) -> usize {
        let fqns: Vec<String> = self.pending.keys().cloned().collect();
        let mut resolved = 0usize;
        for fqn in fqns {
            let target = symbols
                .find_by_fully_qualified_name(&fqn)
                .first()
                .and_then(|s| s.id)
                .map(|id| (id, false))
                .or_else(|| {
                    stubs.and_then(|stub| {
                        stub.find_by_fully_qualified_name(&fqn)
                            .first()
                            .and_then(|s| s.id)
                            .map(|id| (id, true))
                    })
                });
            let Some((symbol_id, is_stub)) = target else {
                continue;
            };
            for id in self.take_pending(&fqn) {
                if is_stub {
                    self.link_stub(id, symbol_id);
                } else {
                    self.link(id, symbols, symbol_id);
                }
                resolved += 1;
            }
        }
        if resolved > 0 {
            tracing::debug!(resolved, still_pending = self.pending_count(), "linked pending references");
        }
        resolved
    }

    /// Return references that resolved to any of `deleted` symbols back to
    /// pending. Called after a file's symbols are deleted for re-indexing.
    pub fn unresolve_for_deleted_symbols(&mut self, deleted: &[blade_lsp_types::Symbol]) {
        for symbol in deleted {
            for id in &symbol.reference_ids {
                if let Some(reference) = self.references.get_mut(id) {
                    if reference.resolved_symbol_id == symbol.id {
                        reference.resolved_symbol_id = None;
                        self.pending
                            .entry(reference.fully_qualified_name.clone())
                            .or_default()
                            .push(*id);
                    }
                }
            }
        }
    }

    /// Remove a file's references from the table, the backlog and the
    /// back-links held by their target symbols.
    pub fn delete_by_source_file(&mut self, source_file: &str, symbols: &mut SymbolTable) {
        let ids = match self.source_file_index.remove(source_file) {
            Some(ids) => ids,
            None => return,
        };
        for id in ids {
            let Some(reference) = self.references.remove(&id) else {
                continue;
            };
            if let Some(list) = self.pending.get_mut(&reference.fully_qualified_name) {
                list.retain(|existing| *existing != id);
                if list.is_empty() {
                    self.pending.remove(&reference.fully_qualified_name);
                }
            }
            if let Some(symbol_id) = reference.resolved_symbol_id {
                if let Some(symbol) = symbols.get_mut(symbol_id) {
                    symbol.reference_ids.retain(|existing| *existing != id);
                }
            }
        }
    }

    // --- Persistence ---

    pub fn save(&self) -> ReferenceTableSnapshot {
        let mut references: Vec<(ReferenceId, Reference)> = self
            .references
            .iter()
            .map(|(id, r)| (*id, r.clone()))
            .collect();
        references.sort_by_key(|(id, _)| *id);
        ReferenceTableSnapshot {
            references,
            source_file_index: self.source_file_index.clone(),
            pending: self.pending.clone(),
            next_id: self.next_id,
        }
    }

    pub fn load(snapshot: ReferenceTableSnapshot) -> Self {
        ReferenceTable {
            references: snapshot.references.into_iter().collect(),
            next_id: snapshot.next_id.max(1),
            source_file_index: snapshot.source_file_index,
            pending: snapshot.pending,
        }
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blade_lsp_types::{Span, Symbol, SymbolKind};

    fn make_reference(name: &str, fqn: &str, file: &str) -> Reference {
        let mut reference = Reference::new(name, SymbolKind::Class, Span::zero());
        reference.fully_qualified_name = fqn.to_string();
        reference.source_file = file.to_string();
        reference
    }

    fn make_symbol(name: &str, scope: &str, file: &str) -> Symbol {
        let mut symbol = Symbol::new(name, SymbolKind::Class, Span::zero());
        symbol.scope = scope.to_string();
        symbol.source_file = file.to_string();
        symbol
    }

    #[test]
    fn test_unresolved_reference_goes_pending() {
        let mut table = ReferenceTable::new();
        let id = table.add_reference(make_reference("Foo", "App\\Foo", "file:///a.php"));
        assert_eq!(id, ReferenceId(1));
        assert_eq!(table.pending_count(), 1);
        assert!(table.get(id).unwrap().is_pending());
    }

    #[test]
    fn test_take_pending_then_link_is_bidirectional() {
        let mut symbols = SymbolTable::new();
        let mut table = ReferenceTable::new();
        let ref_id = table.add_reference(make_reference("Foo", "App\\Foo", "file:///a.php"));

        let symbol_id = symbols
            .add_symbol(make_symbol("Foo", "App", "file:///b.php"))
            .unwrap();
        for pending in table.take_pending("App\\Foo") {
            table.link(pending, &mut symbols, symbol_id);
        }

        assert_eq!(table.pending_count(), 0);
        assert_eq!(table.get(ref_id).unwrap().resolved_symbol_id, Some(symbol_id));
        assert!(symbols.get(symbol_id).unwrap().reference_ids.contains(&ref_id));
    }

    #[test]
    fn test_link_pending_references_sweep() {
        let mut symbols = SymbolTable::new();
        let mut table = ReferenceTable::new();
        table.add_reference(make_reference("Foo", "App\\Foo", "file:///a.php"));
        table.add_reference(make_reference("Gone", "App\\Gone", "file:///a.php"));
        symbols
            .add_symbol(make_symbol("Foo", "App", "file:///b.php"))
            .unwrap();

        let resolved = table.link_pending_references(&mut symbols, None);
        assert_eq!(resolved, 1);
        assert_eq!(table.pending_count(), 1); // App\Gone stays pending
    }

    #[test]
    fn test_stub_fallback_is_one_directional() {
        let mut stub_symbols = SymbolTable::new();
        let stub_id = stub_symbols
            .add_symbol(make_symbol("Exception", "", "phpstub://Core.php"))
            .unwrap();

        let mut symbols = SymbolTable::new();
        let mut table = ReferenceTable::new();
        let ref_id = table.add_reference(make_reference("Exception", "Exception", "file:///a.php"));

        let resolved = table.link_pending_references(&mut symbols, Some(&stub_symbols));
        assert_eq!(resolved, 1);
        assert_eq!(table.get(ref_id).unwrap().resolved_symbol_id, Some(stub_id));
        // The stub table was not mutated.
        assert!(stub_symbols.get(stub_id).unwrap().reference_ids.is_empty());
    }

    #[test]
    fn test_unresolve_for_deleted_symbols() {
        let mut symbols = SymbolTable::new();
        let mut table = ReferenceTable::new();
        let ref_id = table.add_reference(make_reference("Foo", "App\\Foo", "file:///a.php"));
        let symbol_id = symbols
            .add_symbol(make_symbol("Foo", "App", "file:///b.php"))
            .unwrap();
        for pending in table.take_pending("App\\Foo") {
            table.link(pending, &mut symbols, symbol_id);
        }

        let deleted = symbols.delete_by_source_file("file:///b.php");
        table.unresolve_for_deleted_symbols(&deleted);

        assert!(table.get(ref_id).unwrap().is_pending());
        assert_eq!(table.pending_count(), 1);
    }

    #[test]
    fn test_delete_by_source_file_removes_backlinks() {
        let mut symbols = SymbolTable::new();
        let mut table = ReferenceTable::new();
        let ref_id = table.add_reference(make_reference("Foo", "App\\Foo", "file:///a.php"));
        let symbol_id = symbols
            .add_symbol(make_symbol("Foo", "App", "file:///b.php"))
            .unwrap();
        for pending in table.take_pending("App\\Foo") {
            table.link(pending, &mut symbols, symbol_id);
        }

        table.delete_by_source_file("file:///a.php", &mut symbols);
        assert!(table.get(ref_id).is_none());
        assert!(symbols.get(symbol_id).unwrap().reference_ids.is_empty());
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut table = ReferenceTable::new();
        table.add_reference(make_reference("Foo", "App\\Foo", "file:///a.php"));
        let snapshot = table.save();
        let json = serde_json::to_string(&snapshot).unwrap();
        let reloaded = ReferenceTable::load(serde_json::from_str(&json).unwrap());
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.pending_count(), 1);
        assert_eq!(
            reloaded.find_by_source_file("file:///a.php").len(),
            table.find_by_source_file("file:///a.php").len()
        );
    }
}

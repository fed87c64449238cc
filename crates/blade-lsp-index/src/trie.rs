//! Name-prefix trie over symbol ids, used for completion-style lookup.
//!
//! Keys are lowercased so prefix queries are case-insensitive. The trie is
//! rebuilt from the symbol arena on load and is never persisted.

use blade_lsp_types::SymbolId;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    ids: Vec<SymbolId>,
}

impl TrieNode {
    fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.children.is_empty()
    }
}

/// Prefix index from symbol names to symbol ids.
#[derive(Debug, Default)]
pub struct NameTrie {
    root: TrieNode,
}

impl NameTrie {
    pub fn new() -> Self {
        NameTrie::default()
    }

    pub fn insert(&mut self, name: &str, id: SymbolId) {
        let mut node = &mut self.root;
        for ch in name.chars().flat_map(char::to_lowercase) {
            node = node.children.entry(ch).or_default();
        }
        if !node.ids.contains(&id) {
            node.ids.push(id);
        }
    }

    /// Remove one id registered under `name`, pruning empty branches.
    pub fn remove(&mut self, name: &str, id: SymbolId) {
        let chars: Vec<char> = name.chars().flat_map(char::to_lowercase).collect();
        Self::remove_rec(&mut self.root, &chars, id);
    }

    fn remove_rec(node: &mut TrieNode, chars: &[char], id: SymbolId) {
        match chars.split_first() {
            None => node.ids.retain(|existing| *existing != id),
            Some((first, rest)) => {
                if let Some(child) = node.children.get_mut(first) {
                    Self::remove_rec(child, rest, id);
                    if child.is_empty() {
                        node.children.remove(first);
                    }
                }
            }
        }
    }

    /// All ids whose name starts with `prefix` (case-insensitive). An empty
    /// prefix returns everything.
    pub fn find_prefix(&self, prefix: &str) -> Vec<SymbolId> {
        let mut node = &self.root;
        for ch in prefix.chars().flat_map(char::to_lowercase) {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut ids = Vec::new();
        Self::collect(node, &mut ids);
        ids
    }

    fn collect(node: &TrieNode, out: &mut Vec<SymbolId>) {
        out.extend_from_slice(&node.ids);
        for child in node.children.values() {
            Self::collect(child, out);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find_prefix() {
        let mut trie = NameTrie::new();
        trie.insert("FooController", SymbolId(1));
        trie.insert("FooService", SymbolId(2));
        trie.insert("Bar", SymbolId(3));

        let mut found = trie.find_prefix("foo");
        found.sort();
        assert_eq!(found, vec![SymbolId(1), SymbolId(2)]);
        assert_eq!(trie.find_prefix("baz"), Vec::<SymbolId>::new());
    }

    #[test]
    fn test_find_prefix_is_case_insensitive() {
        let mut trie = NameTrie::new();
        trie.insert("UserService", SymbolId(7));
        assert_eq!(trie.find_prefix("userse"), vec![SymbolId(7)]);
        assert_eq!(trie.find_prefix("USERSE"), vec![SymbolId(7)]);
    }

    #[test]
    fn test_remove_prunes_branches() {
        let mut trie = NameTrie::new();
        trie.insert("Foo", SymbolId(1));
        trie.remove("Foo", SymbolId(1));
        assert!(trie.find_prefix("f").is_empty());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_remove_keeps_siblings() {
        let mut trie = NameTrie::new();
        trie.insert("Foo", SymbolId(1));
        trie.insert("Foobar", SymbolId(2));
        trie.remove("Foo", SymbolId(1));
        assert_eq!(trie.find_prefix("foo"), vec![SymbolId(2)]);
    }

    #[test]
    fn test_same_name_multiple_ids() {
        let mut trie = NameTrie::new();
        trie.insert("Foo", SymbolId(1));
        trie.insert("Foo", SymbolId(2));
        let mut found = trie.find_prefix("foo");
        found.sort();
        assert_eq!(found, vec![SymbolId(1), SymbolId(2)]);
    }
}

//! Workspace indexer.
//!
//! Orchestrates per-file compile → analyze → commit across project spaces.
//! A distinguished stub space holds built-in/vendor declarations, is indexed
//! once at startup and serves as the read-only last-resort resolution layer
//! for every user space. Files are processed in fixed-size batches: content
//! loads run concurrently within a batch, commits are strictly sequential,
//! and a batch completes before the next one starts.

use crate::analyzer::{Analyzer, Document};
use crate::reference_table::ReferenceTable;
use crate::resolver::NamespaceResolver;
use crate::symbol_table::SymbolTable;
use blade_lsp_parser::parser::{parse_template, ParserOptions};
use blade_lsp_parser::php::ExpressionParser;
use dashmap::DashMap;
use futures::future::join_all;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Files per batch. Loads within a batch run concurrently; the batch
/// barrier keeps overall parallelism bounded.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Languages the indexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLanguage {
    Blade,
    Php,
}

impl FileLanguage {
    pub fn from_uri(uri: &str) -> Option<FileLanguage> {
        if uri.ends_with(".blade.php") {
            Some(FileLanguage::Blade)
        } else if uri.ends_with(".php") {
            Some(FileLanguage::Php)
        } else {
            None
        }
    }
}

/// Collaborator boundary: the core never touches the filesystem. Returns
/// the document content when the uri is one of the allowed languages.
pub trait FileFetcher: Send + Sync {
    fn load_if_language(
        &self,
        uri: &str,
        allowed: &[FileLanguage],
    ) -> impl Future<Output = Option<String>> + Send;
}

/// A file that could not be indexed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFile {
    pub uri: String,
    pub reason: String,
}

/// Result of one indexing run.
#[derive(Debug, Default)]
pub struct IndexSummary {
    pub indexed: usize,
    pub symbol_count: usize,
    pub resolved_links: usize,
    pub missing: Vec<MissingFile>,
}

/// One project's tables. Owned exclusively by its workspace entry; mutations
/// are serialized by the surrounding mutex.
#[derive(Debug)]
pub struct ProjectSpace {
    pub root: String,
    pub symbols: SymbolTable,
    pub references: ReferenceTable,
    pub resolver: NamespaceResolver,
    pub missing: Vec<MissingFile>,
}

impl ProjectSpace {
    pub fn new(root: &str) -> Self {
        ProjectSpace {
            root: root.to_string(),
            symbols: SymbolTable::new(),
            references: ReferenceTable::new(),
            resolver: NamespaceResolver::new(),
            missing: Vec::new(),
        }
    }

    /// Re-attempt the whole pending backlog, with the stub fallback.
    pub fn link_pending(&mut self, stubs: Option<&SymbolTable>) -> usize {
        self.references
            .link_pending_references(&mut self.symbols, stubs)
    }

    /// Delete a file's symbols and references ahead of re-indexing.
    /// References elsewhere that resolved into this file revert to pending.
    pub fn delete_file(&mut self, uri: &str) {
        let removed = self.symbols.delete_by_source_file(uri);
        self.references.unresolve_for_deleted_symbols(&removed);
        self.references
            .delete_by_source_file(uri, &mut self.symbols);
        self.missing.retain(|m| m.uri != uri);
    }
}

/// The workspace: one stub space plus one space per project root.
pub struct Workspace<F: FileFetcher> {
    fetcher: F,
    batch_size: usize,
    stub_space: ProjectSpace,
    stub_ready: bool,
    spaces: DashMap<String, Arc<Mutex<ProjectSpace>>>,
}

impl<F: FileFetcher> Workspace<F> {
    pub fn new(fetcher: F) -> Self {
        Workspace {
            fetcher,
            batch_size: DEFAULT_BATCH_SIZE,
            stub_space: ProjectSpace::new("phpstub://"),
            stub_ready: false,
            spaces: DashMap::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Index built-in/vendor declarations into the stub space. Called once
    /// at startup; the stub tables are treated as immutable afterwards.
    pub async fn index_stub_space(&mut self, files: &[String]) -> IndexSummary {
        let analyzer = Analyzer::new();
        let summary = index_into(
            &self.fetcher,
            self.batch_size,
            &analyzer,
            &mut self.stub_space,
            files,
            &[FileLanguage::Php],
            true,
            None,
        )
        .await;
        self.stub_ready = true;
        tracing::info!(
            files = summary.indexed,
            symbols = summary.symbol_count,
            "stub space indexed"
        );
        summary
    }

    /// The read-only stub symbol table.
    pub fn stub_symbols(&self) -> &SymbolTable {
        &self.stub_space.symbols
    }

    fn stubs(&self) -> Option<&SymbolTable> {
        self.stub_ready.then_some(&self.stub_space.symbols)
    }

    fn space_handle(&self, root: &str) -> Arc<Mutex<ProjectSpace>> {
        let entry = self
            .spaces
            .entry(root.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ProjectSpace::new(root))));
        Arc::clone(entry.value())
    }

    /// Index a user space: enumerated files arrive from the caller, content
    /// comes through the file fetcher, and an optional composer manifest
    /// feeds the resolver's PSR-4 table. Ends with a pending-reference link
    /// sweep over the space.
    pub async fn index_space(
        &self,
        root: &str,
        files: &[String],
        autoload_manifest: Option<&str>,
    ) -> IndexSummary {
        let handle = self.space_handle(root);
        let mut space = handle.lock().await;

        if let Some(manifest) = autoload_manifest {
            if let Err(reason) = space.resolver.load_autoload(manifest, Path::new(root)) {
                tracing::warn!(%root, %reason, "ignoring invalid autoload manifest");
            }
        }

        let analyzer = Analyzer::new();
        index_into(
            &self.fetcher,
            self.batch_size,
            &analyzer,
            &mut space,
            files,
            &[FileLanguage::Blade, FileLanguage::Php],
            false,
            self.stubs(),
        )
        .await
    }

    /// Re-index a single changed file: delete its previous symbols and
    /// references, compile and commit it again, then run a targeted
    /// re-link pass for the space.
    pub async fn reindex_file(&self, root: &str, uri: &str) -> Result<(), String> {
        let handle = self.space_handle(root);
        let mut space = handle.lock().await;

        space.delete_file(uri);

        let Some(language) = FileLanguage::from_uri(uri) else {
            let reason = "not an indexable language".to_string();
            space.missing.push(MissingFile {
                uri: uri.to_string(),
                reason: reason.clone(),
            });
            return Err(reason);
        };
        let content = self
            .fetcher
            .load_if_language(uri, &[FileLanguage::Blade, FileLanguage::Php])
            .await;
        let Some(content) = content else {
            let reason = "content not loadable".to_string();
            space.missing.push(MissingFile {
                uri: uri.to_string(),
                reason: reason.clone(),
            });
            return Err(reason);
        };

        let analyzer = Analyzer::new();
        let mut php = ExpressionParser::default();
        let stubs = self.stubs();
        compile_and_commit(&analyzer, &mut php, &mut space, uri, language, &content, stubs)
            .map_err(|reason| {
                space.missing.push(MissingFile {
                    uri: uri.to_string(),
                    reason: reason.clone(),
                });
                reason
            })?;
        space.link_pending(stubs);
        Ok(())
    }

    /// Run a query against a space's tables under its lock.
    pub async fn with_space<R>(
        &self,
        root: &str,
        query: impl FnOnce(&ProjectSpace) -> R,
    ) -> Option<R> {
        let handle = {
            let entry = self.spaces.get(root)?;
            Arc::clone(entry.value())
        };
        let space = handle.lock().await;
        Some(query(&space))
    }
}

/// Shared batch pipeline for stub and user spaces.
#[allow(clippy::too_many_arguments)]
async fn index_into<F: FileFetcher>(
    fetcher: &F,
    batch_size: usize,
    analyzer: &Analyzer,
    space: &mut ProjectSpace,
    files: &[String],
    allowed: &[FileLanguage],
    mark_builtin: bool,
    stubs: Option<&SymbolTable>,
) -> IndexSummary {
    let mut summary = IndexSummary::default();
    let mut php = ExpressionParser::default();

    for batch in files.chunks(batch_size) {
        // Content fetches run concurrently; the batch barrier waits for all
        // of them before committing anything.
        let loads = join_all(batch.iter().map(|uri| async move {
            let content = fetcher.load_if_language(uri, allowed).await;
            (uri.as_str(), content)
        }))
        .await;

        // Commits are sequential: no suspension point between a file's
        // analyze and its table mutations.
        for (uri, content) in loads {
            let Some(language) = FileLanguage::from_uri(uri).filter(|l| allowed.contains(l)) else {
                record_missing(space, &mut summary, uri, "not an indexable language");
                continue;
            };
            let Some(content) = content else {
                record_missing(space, &mut summary, uri, "content not loadable");
                continue;
            };
            match compile_and_commit(analyzer, &mut php, space, uri, language, &content, stubs) {
                Ok(mut analysis) => {
                    if mark_builtin {
                        for symbol in &mut analysis.symbols {
                            if let Some(id) = symbol.id {
                                if let Some(stored) = space.symbols.get_mut(id) {
                                    stored.modifiers.is_builtin = true;
                                }
                            }
                        }
                    }
                    summary.indexed += 1;
                    summary.symbol_count += analysis.symbols.len();
                }
                Err(reason) => record_missing(space, &mut summary, uri, &reason),
            }
        }
    }

    summary.resolved_links = space.link_pending(stubs);
    summary
}

fn record_missing(space: &mut ProjectSpace, summary: &mut IndexSummary, uri: &str, reason: &str) {
    tracing::warn!(%uri, %reason, "skipping file");
    let missing = MissingFile {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };
    space.missing.push(missing.clone());
    summary.missing.push(missing);
}

/// Compile one file and commit its symbols/references into the space.
fn compile_and_commit(
    analyzer: &Analyzer,
    php: &mut ExpressionParser,
    space: &mut ProjectSpace,
    uri: &str,
    language: FileLanguage,
    content: &str,
    stubs: Option<&SymbolTable>,
) -> Result<blade_lsp_types::FileAnalysis, String> {
    match language {
        FileLanguage::Blade => {
            let tree = parse_template(content, ParserOptions::default())
                .map_err(|e| format!("template parse failure: {}", e))?;
            Ok(analyzer.analyze(
                uri,
                Document::Template(&tree),
                &mut space.resolver,
                &mut space.symbols,
                &mut space.references,
                stubs,
            ))
        }
        FileLanguage::Php => {
            let ast = php
                .parse_source(content)
                .ok_or_else(|| "PHP parse failure".to_string())?;
            Ok(analyzer.analyze(
                uri,
                Document::Php(&ast),
                &mut space.resolver,
                &mut space.symbols,
                &mut space.references,
                stubs,
            ))
        }
    }
}

//! Workspace indexer CLI.
//!
//! Indexes a project directory and prints a summary. Useful for inspecting
//! what the semantic core extracts without an editor attached. Filesystem
//! access lives here, behind the file-fetcher boundary the core requires.

use blade_lsp_index::workspace::{FileFetcher, FileLanguage, Workspace};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

struct FsFetcher;

impl FileFetcher for FsFetcher {
    async fn load_if_language(&self, uri: &str, allowed: &[FileLanguage]) -> Option<String> {
        let language = FileLanguage::from_uri(uri)?;
        if !allowed.contains(&language) {
            return None;
        }
        tokio::fs::read_to_string(uri).await.ok()
    }
}

/// Collect .php/.blade.php files under `dir`, recursively.
fn collect_files(dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == "vendor" || n == "node_modules") {
                continue;
            }
            collect_files(&path, out);
        } else if FileLanguage::from_uri(&path.to_string_lossy()).is_some() {
            out.push(path.to_string_lossy().into_owned());
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::info!(root = %root.display(), "indexing workspace");

    let mut files = Vec::new();
    collect_files(&root, &mut files);
    files.sort();

    let manifest = std::fs::read_to_string(root.join("composer.json")).ok();

    let workspace = Workspace::new(FsFetcher);
    let summary = workspace
        .index_space(&root.to_string_lossy(), &files, manifest.as_deref())
        .await;

    println!(
        "indexed {} files, {} symbols, {} links resolved",
        summary.indexed, summary.symbol_count, summary.resolved_links
    );
    if !summary.missing.is_empty() {
        println!("missing ({}):", summary.missing.len());
        for missing in &summary.missing {
            println!("  {}: {}", missing.uri, missing.reason);
        }
    }
}

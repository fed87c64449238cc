//! Stub-space helpers.
//!
//! The stub space holds built-in and vendor declarations, laid out in the
//! phpstorm-stubs convention of one directory per extension. These helpers
//! select which stub files to feed into
//! [`Workspace::index_stub_space`](crate::workspace::Workspace::index_stub_space);
//! loading still goes through the file-fetcher boundary.

/// Extensions that are always loaded (common PHP extensions).
pub const DEFAULT_STUB_EXTENSIONS: &[&str] = &[
    "Core",
    "standard",
    "date",
    "json",
    "pcre",
    "SPL",
    "mbstring",
    "curl",
    "dom",
    "SimpleXML",
    "xml",
    "filter",
    "hash",
    "session",
    "tokenizer",
    "ctype",
    "fileinfo",
    "pdo",
    "Reflection",
];

/// Filter an enumerated stub file list down to the requested extension
/// directories.
pub fn filter_stub_files(files: &[String], extensions: &[&str]) -> Vec<String> {
    files
        .iter()
        .filter(|uri| {
            extensions
                .iter()
                .any(|ext| uri.contains(&format!("/{}/", ext)))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extensions_contain_core() {
        assert!(DEFAULT_STUB_EXTENSIONS.contains(&"Core"));
        assert!(DEFAULT_STUB_EXTENSIONS.contains(&"standard"));
    }

    #[test]
    fn test_filter_stub_files() {
        let files = vec![
            "phpstub://Core/Core.php".to_string(),
            "phpstub://standard/standard_1.php".to_string(),
            "phpstub://imagick/imagick.php".to_string(),
        ];
        let filtered = filter_stub_files(&files, &["Core", "standard"]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|f| !f.contains("imagick")));
    }
}

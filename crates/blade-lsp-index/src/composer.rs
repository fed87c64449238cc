//! Composer autoload metadata parsing.
//!
//! Reads the `autoload`/`autoload-dev` → `psr-4` mapping out of a
//! composer-style manifest and builds a namespace-prefix-to-directory table.
//! The manifest arrives as raw JSON text; the core never reads the disk.
//! The mapping feeds path heuristics only, not reference resolution.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// PSR-4 namespace mapping extracted from autoload configuration.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    /// Namespace prefix → directories, in declaration order.
    pub psr4: Vec<(String, Vec<PathBuf>)>,
}

impl NamespaceMap {
    /// Resolve a fully qualified class name to candidate file paths.
    ///
    /// E.g., with mapping `App\` → `src/`, resolving `App\Service\Foo`
    /// returns `[src/Service/Foo.php]`.
    pub fn resolve_class_to_paths(&self, fqn: &str) -> Vec<PathBuf> {
        let mut results = Vec::new();
        for (prefix, dirs) in &self.psr4 {
            if let Some(relative) = fqn.strip_prefix(prefix.as_str()) {
                let relative_path = relative.replace('\\', "/") + ".php";
                for dir in dirs {
                    results.push(dir.join(&relative_path));
                }
            }
        }
        results
    }

    /// All directories the mapping points at, for file enumeration
    /// heuristics.
    pub fn source_directories(&self) -> Vec<&Path> {
        self.psr4
            .iter()
            .flat_map(|(_, dirs)| dirs.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// Partial composer.json schema (only what we need).
#[derive(Debug, Deserialize, Default)]
struct ComposerJson {
    #[serde(default)]
    autoload: AutoloadSection,
    #[serde(default, rename = "autoload-dev")]
    autoload_dev: AutoloadSection,
}

#[derive(Debug, Deserialize, Default)]
struct AutoloadSection {
    #[serde(default, rename = "psr-4")]
    psr4: HashMap<String, Psr4Value>,
}

/// A PSR-4 value can be a string or an array of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Psr4Value {
    Single(String),
    Multiple(Vec<String>),
}

impl Psr4Value {
    fn to_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        match self {
            Psr4Value::Single(s) => vec![base_dir.join(s)],
            Psr4Value::Multiple(v) => v.iter().map(|s| base_dir.join(s)).collect(),
        }
    }
}

/// Parse manifest text with a base directory for resolving relative paths.
pub fn parse_autoload(content: &str, base_dir: &Path) -> Result<NamespaceMap, String> {
    let composer: ComposerJson =
        serde_json::from_str(content).map_err(|e| format!("Invalid composer manifest: {}", e))?;

    let mut map = NamespaceMap::default();
    for section in [&composer.autoload, &composer.autoload_dev] {
        for (prefix, value) in &section.psr4 {
            map.psr4.push((prefix.clone(), value.to_paths(base_dir)));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_psr4() {
        let json = r#"{
            "autoload": {
                "psr-4": {
                    "App\\": "src/"
                }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/project")).unwrap();
        assert_eq!(map.psr4.len(), 1);
        assert_eq!(map.psr4[0].0, "App\\");
        assert_eq!(map.psr4[0].1, vec![PathBuf::from("/project/src/")]);
    }

    #[test]
    fn test_parse_psr4_with_dev() {
        let json = r#"{
            "autoload": {
                "psr-4": {
                    "App\\": "src/"
                }
            },
            "autoload-dev": {
                "psr-4": {
                    "App\\Tests\\": "tests/"
                }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/project")).unwrap();
        assert_eq!(map.psr4.len(), 2);
    }

    #[test]
    fn test_parse_multiple_dirs() {
        let json = r#"{
            "autoload": {
                "psr-4": {
                    "App\\": ["src/", "lib/"]
                }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/project")).unwrap();
        assert_eq!(map.psr4[0].1.len(), 2);
    }

    #[test]
    fn test_resolve_class_psr4() {
        let json = r#"{
            "autoload": {
                "psr-4": {
                    "App\\": "src/"
                }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/project")).unwrap();
        let paths = map.resolve_class_to_paths("App\\Service\\UserService");
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths[0],
            PathBuf::from("/project/src/Service/UserService.php")
        );
    }

    #[test]
    fn test_resolve_class_not_matching() {
        let json = r#"{
            "autoload": {
                "psr-4": {
                    "App\\": "src/"
                }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/project")).unwrap();
        assert!(map.resolve_class_to_paths("Vendor\\SomeClass").is_empty());
    }

    #[test]
    fn test_source_directories() {
        let json = r#"{
            "autoload": {
                "psr-4": { "App\\": "src/" }
            },
            "autoload-dev": {
                "psr-4": { "App\\Tests\\": "tests/" }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/project")).unwrap();
        assert_eq!(map.source_directories().len(), 2);
    }

    #[test]
    fn test_empty_manifest() {
        let map = parse_autoload("{}", Path::new("/project")).unwrap();
        assert!(map.psr4.is_empty());
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        assert!(parse_autoload("{not json", Path::new("/project")).is_err());
    }

    #[test]
    fn test_real_world_laravel() {
        let json = r#"{
            "autoload": {
                "psr-4": {
                    "App\\": "app/",
                    "Database\\Factories\\": "database/factories/",
                    "Database\\Seeders\\": "database/seeders/"
                }
            },
            "autoload-dev": {
                "psr-4": {
                    "Tests\\": "tests/"
                }
            }
        }"#;
        let map = parse_autoload(json, Path::new("/var/www")).unwrap();
        assert_eq!(map.psr4.len(), 4);
        let paths = map.resolve_class_to_paths("App\\Http\\Controllers\\UserController");
        assert_eq!(
            paths[0],
            PathBuf::from("/var/www/app/Http/Controllers/UserController.php")
        );
    }
}

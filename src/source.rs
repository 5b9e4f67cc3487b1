//! Loading query documents from files, directories and stdin.

use ignore::types::{Types, TypesBuilder};
use ignore::WalkBuilder;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    Syntax(serde_yaml::Error),
    Walk(ignore::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "Read error: {}", e),
            LoadError::Syntax(e) => write!(f, "Syntax error: {}", e),
            LoadError::Walk(e) => write!(f, "Walk error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Syntax(e) => Some(e),
            LoadError::Walk(e) => Some(e),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        LoadError::Syntax(e)
    }
}

impl From<ignore::Error> for LoadError {
    fn from(e: ignore::Error) -> Self {
        LoadError::Walk(e)
    }
}

fn query_file_types() -> Result<Types, ignore::Error> {
    let mut types = TypesBuilder::new();
    for ext in EXTENSIONS {
        types.add("query", &format!("*.{}", ext))?;
    }
    types.select("query").build()
}

/// Saved query documents under `dir`, sorted by path. Entries that cannot be
/// read are logged and skipped.
pub fn collect_query_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_global(false)
        .git_exclude(false)
        .add_custom_ignore_filename(".qtransignore")
        .types(query_file_types()?)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().map_or(false, |t| t.is_file()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => log::warn!("skipping entry under {}: {}", dir.display(), e),
        }
    }

    files.sort();
    Ok(files)
}

/// Strict JSON first, YAML otherwise. serde_yaml rejects some valid JSON
/// (surrogate-pair `\u` escapes), so it is only the fallback.
pub fn parse_document(text: &str) -> Result<Value, LoadError> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_yaml::from_str(text)?),
    }
}

pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path)?;
    log::debug!("loaded {} ({} bytes)", path.display(), content.len());
    parse_document(&content)
}

pub fn read_document_from_stdin() -> Result<Value, LoadError> {
    let mut content = String::new();
    io::stdin().lock().read_to_string(&mut content)?;
    parse_document(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_document() {
        let doc = parse_document(r#"{"filter": {"a": {"$eq": 1}}, "sort": []}"#).unwrap();
        assert_eq!(doc, json!({"filter": {"a": {"$eq": 1}}, "sort": []}));
    }

    #[test]
    fn test_parse_yaml_document() {
        let content = r#"
filter:
  $or:
    - urgency: {$lte: 2}
    - state: {$eq: published}
sort:
  - versioncreated: desc
page: 1
max_results: 25
"#;
        let doc = parse_document(content).unwrap();
        assert_eq!(doc["filter"]["$or"][1], json!({"state": {"$eq": "published"}}));
        assert_eq!(doc["max_results"], json!(25));
    }

    #[test]
    fn test_parse_json_surrogate_escapes() {
        let doc = parse_document(r#"{"q": "\ud83d\ude00"}"#).unwrap();
        assert_eq!(doc, json!({"q": "\u{1F600}"}));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_document("{\"a\": ").unwrap_err();
        assert!(matches!(err, LoadError::Syntax(_)));
    }

    #[test]
    fn test_collect_query_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();
        fs::write(root.join("nested/b.yaml"), "{}").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("skip.yml"), "{}").unwrap();
        fs::write(root.join(".qtransignore"), "skip.yml\n").unwrap();

        let files = collect_query_files(root).unwrap();
        assert_eq!(files, vec![root.join("a.json"), root.join("nested/b.yaml")]);
    }

    #[test]
    fn test_collect_skips_walk_errors() {
        let dir = tempfile::tempdir().unwrap();
        let files = collect_query_files(&dir.path().join("missing")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}

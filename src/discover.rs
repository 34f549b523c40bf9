//! Finding draw.io documents under the harvester's input paths.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Shape directories inside an unpacked draw.io desktop bundle.
const SHAPES_DIR_CANDIDATES: &[&str] = &[
    "drawio/src/main/webapp/shapes",
    "drawio/src/main/webapp/js/shapes",
    "app/resources/shapes",
    "resources/shapes",
];

/// Templates live here and carry useful styles too.
const WEBAPP_DIR: &str = "drawio/src/main/webapp";

const DIAGRAM_EXTENSIONS: &[&str] = &["drawio", "xml"];

/// Adds the known shape directories found below each input directory.
/// Duplicates (by canonical path) are dropped, first occurrence wins.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded: Vec<PathBuf> = inputs.to_vec();
    for base in inputs.iter().filter(|p| p.is_dir()) {
        for rel in SHAPES_DIR_CANDIDATES.iter().chain(std::iter::once(&WEBAPP_DIR)) {
            let candidate = base.join(rel);
            if candidate.is_dir() {
                log::debug!(path:? = candidate; "Found shapes directory candidate");
                expanded.push(candidate);
            }
        }
    }
    dedup_by_canonical(expanded)
}

/// Lists the `.drawio` / `.xml` files under the given paths.
///
/// Directories are walked recursively. With a glob, only files whose path
/// relative to that directory matches it are kept. Plain file inputs are
/// taken as-is when their extension fits.
///
/// # Errors
///
/// Returns [`Error::Input`] if the glob pattern is invalid.
pub fn collect_files(paths: &[PathBuf], glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let matcher = glob.map(glob_matcher).transpose()?;
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            if let Some(pattern) = glob {
                log::debug!(dir:? = path, pattern; "Applying glob inside directory");
            }
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log::debug!(error:% = err; "Skipping unreadable directory entry");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
            {
                let file = entry.path();
                if !is_diagram_file(file) {
                    continue;
                }
                if let Some(matcher) = &matcher {
                    let rel = relative_glob_path(path, file);
                    if !matcher.is_match(&rel) {
                        continue;
                    }
                }
                files.push(file.to_path_buf());
            }
        } else if is_diagram_file(path) {
            files.push(path.clone());
        }
    }

    let files = dedup_by_canonical(files);
    log::debug!(count = files.len(); "Candidate files collected");
    Ok(files)
}

fn is_diagram_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| DIAGRAM_EXTENSIONS.contains(&e.as_str()))
}

fn relative_glob_path(base: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(base).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn dedup_by_canonical(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(fs::canonicalize(p).unwrap_or_else(|_| p.clone())))
        .collect()
}

/// Compiles a shell glob over `/`-separated relative paths. `*` and `?` stay
/// within one path segment; `**/` spans any number of directories.
fn glob_matcher(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| Error::Input(format!("Invalid glob pattern `{pattern}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<mxfile/>").unwrap();
    }

    fn names(files: &[PathBuf], base: &Path) -> Vec<String> {
        files.iter().map(|f| relative_glob_path(base, f)).collect()
    }

    #[test]
    fn test_glob_matching() {
        let glob = glob_matcher("**/*.xml").unwrap();
        assert!(glob.is_match("a.xml"));
        assert!(glob.is_match("deep/er/a.xml"));
        assert!(!glob.is_match("a.drawio"));

        let glob = glob_matcher("shapes/*.xml").unwrap();
        assert!(glob.is_match("shapes/er.xml"));
        assert!(!glob.is_match("shapes/sub/er.xml"));

        let glob = glob_matcher("mx?.[!d]*").unwrap();
        assert!(glob.is_match("mx1.xml"));
        assert!(!glob.is_match("mx1.drawio"));
    }

    #[test]
    fn test_invalid_glob_is_input_error() {
        let err = collect_files(&[PathBuf::from(".")], Some("shapes/[a")).unwrap_err();
        assert!(matches!(err, Error::Input(_)), "got {err:?}");
    }

    #[test]
    fn test_collect_walks_and_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("a.drawio"));
        touch(&base.join("nested/b.XML"));
        touch(&base.join("nested/c.txt"));

        let files = collect_files(&[base.to_path_buf()], None).unwrap();
        assert_eq!(names(&files, base), vec!["a.drawio", "nested/b.XML"]);
    }

    #[test]
    fn test_collect_applies_glob_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("top.xml"));
        touch(&base.join("shapes/er.xml"));
        touch(&base.join("shapes/uml.drawio"));

        let files = collect_files(&[base.to_path_buf()], Some("shapes/*")).unwrap();
        assert_eq!(names(&files, base), vec!["shapes/er.xml", "shapes/uml.drawio"]);
    }

    #[test]
    fn test_collect_dedups_overlapping_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        let file = base.join("x.drawio");
        touch(&file);

        let files = collect_files(&[base.to_path_buf(), file.clone()], None).unwrap();
        assert_eq!(files.len(), 1);

        let plain = collect_files(&[base.join("notes.md")], None).unwrap();
        assert!(plain.is_empty());
    }

    #[test]
    fn test_expand_inputs_finds_bundle_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("drawio/src/main/webapp/shapes")).unwrap();
        fs::create_dir_all(base.join("resources/shapes")).unwrap();

        let expanded = expand_inputs(&[base.to_path_buf(), base.to_path_buf()]);
        assert_eq!(
            expanded,
            vec![
                base.to_path_buf(),
                base.join("drawio/src/main/webapp/shapes"),
                base.join("resources/shapes"),
                base.join("drawio/src/main/webapp"),
            ]
        );
    }
}

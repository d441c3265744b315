//! Locating the document behind a dotted module name.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Probes search roots for `<root>/<last name component><suffix>`.
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    search_paths: Vec<PathBuf>,
    suffixes: Vec<String>,
}

impl DocumentResolver {
    pub fn new(search_paths: Vec<PathBuf>, suffixes: Vec<String>) -> Self {
        Self {
            search_paths,
            suffixes,
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn set_suffixes(&mut self, suffixes: Vec<String>) {
        self.suffixes = suffixes;
    }

    /// The file stem for a dotted name: only its last component.
    pub fn file_stem(name: &str) -> &str {
        name.rsplit('.').next().unwrap_or(name)
    }

    /// Every path probed for `name`, in probing order: each root, then each suffix.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let stem = Self::file_stem(name);
        self.search_paths
            .iter()
            .flat_map(|root| {
                self.suffixes
                    .iter()
                    .map(move |suffix| root.join(format!("{}{}", stem, suffix)))
            })
            .collect()
    }

    /// The first candidate that exists.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        self.candidates(name).into_iter().find(|candidate| {
            let exists = is_document(candidate);
            debug!(module = name, path = %candidate.display(), exists, "probing");
            exists
        })
    }
}

fn is_document(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_candidates_use_last_component() {
        let resolver = DocumentResolver::new(
            vec![PathBuf::from("/a"), PathBuf::from("/b")],
            vec![".json".to_string(), ".jsn".to_string()],
        );
        assert_eq!(
            resolver.candidates("pkg.sub.people"),
            vec![
                PathBuf::from("/a/people.json"),
                PathBuf::from("/a/people.jsn"),
                PathBuf::from("/b/people.json"),
                PathBuf::from("/b/people.jsn"),
            ]
        );
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("people.json"), "{}").unwrap();
        fs::create_dir(first.path().join("people.json")).unwrap();

        let resolver = DocumentResolver::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            vec![".json".to_string()],
        );
        assert_eq!(resolver.resolve("people"), Some(second.path().join("people.json")));
        assert_eq!(resolver.resolve("missing"), None);
        assert_eq!(resolver.resolve(""), None);
    }
}

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::RepositoryError;
use crate::parser;

pub const DEFAULT_EXTENSION: &str = ".mo";

/// A directory holding `<culture><extension>` catalog files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    path: PathBuf,
    extension: String,
}

impl SearchRoot {
    /// Create a search root. `extension` may be given with or without its leading dot.
    pub fn new(path: impl Into<PathBuf>, extension: &str) -> Self {
        let extension = extension.trim();
        let extension = if extension.is_empty() || extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };
        SearchRoot {
            path: path.into(),
            extension,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The file a culture's catalog would live in under this root.
    pub fn candidate(&self, culture: &str) -> PathBuf {
        self.path.join(format!("{}{}", culture, self.extension))
    }
}

/// Read and parse one catalog file.
pub fn load_catalog_from_file(path: &Path) -> Result<Catalog, RepositoryError> {
    let bytes = fs::read(path).map_err(|source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parser::parse(&bytes).map_err(|source| RepositoryError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Outcome of resolving a culture chain.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The culture whose files were used, `None` when no file matched
    pub culture: Option<String>,
    /// Files merged into the catalog, in precedence order (last wins)
    pub files: Vec<PathBuf>,
    pub catalog: Catalog,
}

/// Locates and merges the catalog files of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRepository {
    roots: Vec<SearchRoot>,
}

impl CatalogRepository {
    pub fn new(roots: Vec<SearchRoot>) -> Self {
        CatalogRepository { roots }
    }

    pub fn roots(&self) -> &[SearchRoot] {
        &self.roots
    }

    /// Resolve a culture fallback chain into one merged catalog.
    ///
    /// The first culture with at least one loadable file wins; its files are
    /// merged in root order so later roots override earlier ones. Unreadable
    /// or malformed files are logged and skipped. When nothing matches, the
    /// result is an empty catalog.
    pub fn resolve<S: AsRef<str>>(&self, chain: &[S]) -> Resolution {
        for culture in chain.iter().map(AsRef::as_ref) {
            if !is_plain_identifier(culture) {
                debug!(culture = %culture, "skipping culture identifier that is not a plain file stem");
                continue;
            }

            let mut merged: Option<Catalog> = None;
            let mut files = Vec::new();
            for root in &self.roots {
                let path = root.candidate(culture);
                if !path.is_file() {
                    continue;
                }
                match load_catalog_from_file(&path) {
                    Ok(catalog) => {
                        debug!(culture = %culture, path = %path.display(), entries = catalog.len(), "loaded catalog");
                        match merged.as_mut() {
                            Some(existing) => existing.merge(catalog),
                            None => merged = Some(catalog),
                        }
                        files.push(path);
                    }
                    Err(e) => warn!(culture = %culture, error = %e, "skipping catalog file"),
                }
            }

            if let Some(catalog) = merged {
                debug!(culture = %culture, files = files.len(), "resolved culture");
                return Resolution {
                    culture: Some(culture.to_string()),
                    files,
                    catalog,
                };
            }
        }

        debug!(chain = %join_chain(chain), "no catalog file for any culture in chain");
        Resolution {
            culture: None,
            files: Vec::new(),
            catalog: Catalog::empty(),
        }
    }

    /// Culture identifiers that have at least one catalog file under any root.
    pub fn available_cultures(&self) -> Vec<String> {
        let mut cultures = BTreeSet::new();
        for root in &self.roots {
            let entries = match fs::read_dir(&root.path) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(root = %root.path.display(), error = %e, "cannot list search root");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                if let Some(culture) = name.strip_suffix(root.extension.as_str()) {
                    if !culture.is_empty() {
                        cultures.insert(culture.to_string());
                    }
                }
            }
        }
        cultures.into_iter().collect()
    }
}

/// Resolve `chain` against `roots`, returning only the merged catalog.
pub fn resolve<S: AsRef<str>>(roots: &[SearchRoot], chain: &[S]) -> Catalog {
    CatalogRepository::new(roots.to_vec()).resolve(chain).catalog
}

fn is_plain_identifier(culture: &str) -> bool {
    !culture.is_empty()
        && culture != "."
        && culture != ".."
        && !culture.contains(['/', '\\'])
}

fn join_chain<S: AsRef<str>>(chain: &[S]) -> String {
    chain
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CatalogBuilder;
    use tempfile::TempDir;

    fn root(dir: &TempDir) -> SearchRoot {
        SearchRoot::new(dir.path(), ".mo")
    }

    fn text(catalog: &Catalog, id: &str) -> Option<String> {
        catalog.get("", id).map(|forms| forms[0].clone())
    }

    #[test]
    fn test_extension_is_normalized() {
        assert_eq!(SearchRoot::new("/tmp", "mo").extension(), ".mo");
        assert_eq!(SearchRoot::new("/tmp", ".mo").extension(), ".mo");
        assert_eq!(
            SearchRoot::new("/tmp", "mo").candidate("fr-FR"),
            PathBuf::from("/tmp/fr-FR.mo")
        );
    }

    #[test]
    fn test_later_root_overrides_earlier() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        CatalogBuilder::new()
            .message("Hello", "Bonjour")
            .message("Bye", "Au revoir")
            .write_to(a.path(), "fr", ".mo");
        CatalogBuilder::new()
            .message("Hello", "Salut")
            .write_to(b.path(), "fr", ".mo");

        let repository = CatalogRepository::new(vec![root(&a), root(&b)]);
        let resolution = repository.resolve(&["fr"]);
        assert_eq!(resolution.culture.as_deref(), Some("fr"));
        assert_eq!(resolution.files.len(), 2);
        assert_eq!(text(&resolution.catalog, "Hello").as_deref(), Some("Salut"));
        assert_eq!(text(&resolution.catalog, "Bye").as_deref(), Some("Au revoir"));

        let reversed = resolve(&[root(&b), root(&a)], &["fr"]);
        assert_eq!(text(&reversed, "Hello").as_deref(), Some("Bonjour"));
    }

    #[test]
    fn test_first_culture_with_files_wins() {
        let dir = TempDir::new().unwrap();
        CatalogBuilder::new()
            .message("Hello", "Bonjour")
            .write_to(dir.path(), "fr", ".mo");
        CatalogBuilder::new()
            .message("Hello", "Hello there")
            .message("Only English", "Only English!")
            .write_to(dir.path(), "en-US", ".mo");

        let resolution = CatalogRepository::new(vec![root(&dir)]).resolve(&["fr-FR", "fr", "en-US"]);
        assert_eq!(resolution.culture.as_deref(), Some("fr"));
        assert_eq!(text(&resolution.catalog, "Hello").as_deref(), Some("Bonjour"));
        assert_eq!(text(&resolution.catalog, "Only English"), None);
    }

    #[test]
    fn test_no_files_yields_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let resolution = CatalogRepository::new(vec![root(&dir)]).resolve(&["de-DE", "de"]);
        assert_eq!(resolution.culture, None);
        assert!(resolution.catalog.is_empty());
        assert_eq!(resolution.catalog.plural_count(), 1);
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        fs::write(a.path().join("fr.mo"), b"not a catalog").unwrap();
        CatalogBuilder::new()
            .message("Hello", "Salut")
            .write_to(b.path(), "fr", ".mo");

        let resolution = CatalogRepository::new(vec![root(&a), root(&b)]).resolve(&["fr"]);
        assert_eq!(resolution.files, vec![b.path().join("fr.mo")]);
        assert_eq!(text(&resolution.catalog, "Hello").as_deref(), Some("Salut"));
    }

    #[test]
    fn test_only_corrupt_files_fall_through_to_next_culture() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fr-FR.mo"), b"\x00\x01").unwrap();
        CatalogBuilder::new()
            .message("Hello", "Bonjour")
            .write_to(dir.path(), "fr", ".mo");

        let resolution = CatalogRepository::new(vec![root(&dir)]).resolve(&["fr-FR", "fr"]);
        assert_eq!(resolution.culture.as_deref(), Some("fr"));
    }

    #[test]
    fn test_path_like_identifiers_are_ignored() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        CatalogBuilder::new()
            .message("Hello", "Hallo")
            .write_to(&nested, "de", ".mo");

        let resolution = CatalogRepository::new(vec![root(&dir)]).resolve(&["nested/de", ".."]);
        assert_eq!(resolution.culture, None);
    }

    #[test]
    fn test_load_catalog_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_catalog_from_file(&dir.path().join("missing.mo"));
        assert!(matches!(result, Err(RepositoryError::Io { .. })));
    }

    #[test]
    fn test_available_cultures() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        CatalogBuilder::new().write_to(a.path(), "fr", ".mo");
        CatalogBuilder::new().write_to(b.path(), "de-DE", ".mo");
        CatalogBuilder::new().write_to(b.path(), "fr", ".mo");
        fs::write(b.path().join("notes.txt"), b"ignored").unwrap();

        let repository = CatalogRepository::new(vec![
            root(&a),
            root(&b),
            SearchRoot::new(a.path().join("missing"), ".mo"),
        ]);
        assert_eq!(repository.available_cultures(), vec!["de-DE", "fr"]);
    }
}

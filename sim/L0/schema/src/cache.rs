//! Explicit cache of loaded documents.
//!
//! Documents live under one root folder, one sub-folder per dialect:
//!
//! ```text
//! <root>/mjcf/<name>.xml
//! <root>/urdf/<name>.urdf
//! ```
//!
//! Entries are loaded on first request and kept until invalidated. Cached
//! documents are handed out as `Arc`s, so a caller holding an older entry
//! keeps a valid document after a reload.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sim_types::ParseConfig;

use crate::element::Element;
use crate::error::Result;
use crate::schema::Dialect;

/// Name-indexed document cache.
#[derive(Debug)]
pub struct ModelCache {
    root: PathBuf,
    config: ParseConfig,
    entries: BTreeMap<(Dialect, String), Arc<Element>>,
}

impl ModelCache {
    /// Create an empty cache over `root`. Nothing is read yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: ParseConfig) -> Self {
        Self {
            root: root.into(),
            config,
            entries: BTreeMap::new(),
        }
    }

    /// Root folder.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration used for every load.
    #[must_use]
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Folder holding a dialect's documents.
    #[must_use]
    pub fn dialect_dir(&self, dialect: Dialect) -> PathBuf {
        self.root.join(dialect.as_str())
    }

    /// File a named document is loaded from.
    #[must_use]
    pub fn path_of(&self, dialect: Dialect, name: &str) -> PathBuf {
        self.dialect_dir(dialect)
            .join(format!("{name}.{}", dialect.extension()))
    }

    /// The named document, loading it on first use.
    pub fn get(&mut self, dialect: Dialect, name: &str) -> Result<Arc<Element>> {
        let key = (dialect, name.to_string());
        if let Some(hit) = self.entries.get(&key) {
            tracing::debug!(%dialect, name, "document cache hit");
            return Ok(Arc::clone(hit));
        }
        tracing::debug!(%dialect, name, "document cache miss");
        self.load(key)
    }

    /// Register an in-memory document under a name.
    ///
    /// Returns the entry it replaced, if any.
    pub fn insert(
        &mut self,
        dialect: Dialect,
        name: impl Into<String>,
        document: Element,
    ) -> Option<Arc<Element>> {
        self.entries
            .insert((dialect, name.into()), Arc::new(document))
    }

    /// Whether a document is cached.
    #[must_use]
    pub fn contains(&self, dialect: Dialect, name: &str) -> bool {
        self.entries.contains_key(&(dialect, name.to_string()))
    }

    /// Number of cached documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached document names of one dialect, sorted.
    #[must_use]
    pub fn names(&self, dialect: Dialect) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|(d, _)| *d == dialect)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Drop one entry. Returns whether it was cached.
    pub fn invalidate(&mut self, dialect: Dialect, name: &str) -> bool {
        let removed = self
            .entries
            .remove(&(dialect, name.to_string()))
            .is_some();
        if removed {
            tracing::debug!(%dialect, name, "document cache entry invalidated");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Re-read a document from disk and replace its entry.
    ///
    /// On failure the previous entry is left untouched.
    pub fn reload(&mut self, dialect: Dialect, name: &str) -> Result<Arc<Element>> {
        self.load((dialect, name.to_string()))
    }

    /// Load every document of a dialect folder. Returns how many were loaded.
    pub fn precache(&mut self, dialect: Dialect) -> Result<usize> {
        let dir = self.dialect_dir(dialect);
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let matches_ext = path
                .extension()
                .is_some_and(|ext| ext == dialect.extension());
            if let (true, Some(stem)) = (matches_ext, path.file_stem()) {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
        names.sort();
        for name in &names {
            self.load((dialect, name.clone()))?;
        }
        Ok(names.len())
    }

    fn load(&mut self, key: (Dialect, String)) -> Result<Arc<Element>> {
        let path = self.path_of(key.0, &key.1);
        let document = Arc::new(Element::from_file(&path, key.0, &self.config)?);
        self.entries.insert(key, Arc::clone(&document));
        Ok(document)
    }
}

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{GoPackage, GoParser};

const DEFAULT_MAX_ENTRIES: usize = 256;

/// Parsed packages keyed by directory, shared by every lookup of one graph build.
pub struct PackageCache {
    packages: HashMap<PathBuf, Rc<GoPackage>>,
    max_entries: usize,
    hits: usize,
    misses: usize,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            packages: HashMap::new(),
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_parse(&mut self, parser: &mut GoParser, directory: &Path) -> Result<Rc<GoPackage>> {
        if let Some(package) = self.packages.get(directory) {
            self.hits += 1;
            return Ok(Rc::clone(package));
        }
        self.misses += 1;

        let package = Rc::new(GoPackage::parse(parser, directory)?);

        if self.packages.len() >= self.max_entries {
            if let Some(key) = self.packages.keys().next().cloned() {
                self.packages.remove(&key);
            }
        }
        self.packages
            .insert(directory.to_path_buf(), Rc::clone(&package));

        Ok(package)
    }

    pub fn clear(&mut self) {
        self.packages.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.packages.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

impl Default for PackageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

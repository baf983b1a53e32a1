pub mod cache;
pub mod common;
pub mod go;
pub mod tag;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::FileScanner;

pub use go::{
    DeclarationKind, FieldDeclaration, GoFile, GoParser, ImportDeclaration, TypeDeclaration,
    TypeRef, TypeWrapper,
};
pub use tag::{StructTag, TagEntry, TagError};

/// Every parseable source file of one directory, in file-name order.
#[derive(Debug, Clone)]
pub struct GoPackage {
    pub directory: PathBuf,
    pub files: Vec<GoFile>,
}

impl GoPackage {
    pub fn parse(parser: &mut GoParser, directory: &Path) -> Result<Self> {
        let mut files = Vec::new();

        for path in FileScanner::new().source_files(directory)? {
            match parser.parse_file(&path) {
                Ok(file) => files.push(file),
                Err(e) => warn!("Failed to parse {}: {}", path.display(), e),
            }
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            files,
        })
    }

    /// First type declaration named `type_name`, scanning files then declarations in order.
    pub fn find_type(&self, type_name: &str) -> Option<(&GoFile, &TypeDeclaration)> {
        let mut matches = self.files.iter().flat_map(|file| {
            file.types
                .iter()
                .filter(move |decl| decl.name == type_name)
                .map(move |decl| (file, decl))
        });

        let first = matches.next()?;
        for (file, _) in matches {
            debug!(
                "{} is also declared in {}, keeping {}",
                type_name,
                file.path.display(),
                first.0.path.display()
            );
        }
        Some(first)
    }
}

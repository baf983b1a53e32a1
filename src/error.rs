//! Error taxonomy for package location and alias resolution.
//!
//! Every failure of the inspector, locator and alias resolver is returned to the
//! caller as a [`LocateError`]. The type graph builder never surfaces these; it
//! logs them and continues with a smaller graph.

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, LocateError>;

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// The filesystem root was reached without matching any location rule.
    #[error("undetectable location for {}", path.display())]
    UndetectableLocation { path: PathBuf },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Empty alias, or no import matched by explicit alias or package name.
    #[error("unresolved alias or package {alias:?}")]
    UnresolvedAlias { alias: String },

    /// The import path is not reachable from the workspace, the standard
    /// library, the declared module dependencies or the legacy workspace.
    #[error("dependency {import_path:?} is not declared")]
    DependencyNotDeclared { import_path: String },

    #[error("malformed module file {}:{line}: {reason}", path.display())]
    ModuleDeclarationParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid module path {path:?}: {reason}")]
    InvalidModulePath { path: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LocateError {
    pub fn undetectable(path: impl Into<PathBuf>) -> Self {
        Self::UndetectableLocation { path: path.into() }
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    pub fn unresolved_alias(alias: impl Into<String>) -> Self {
        Self::UnresolvedAlias {
            alias: alias.into(),
        }
    }

    pub fn not_declared(import_path: impl Into<String>) -> Self {
        Self::DependencyNotDeclared {
            import_path: import_path.into(),
        }
    }

    pub fn module_parse(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::ModuleDeclarationParse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn invalid_module_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidModulePath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Filesystem path associated with this error, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::UndetectableLocation { path }
            | Self::NotADirectory { path }
            | Self::ModuleDeclarationParse { path, .. }
            | Self::Io { path, .. } => Some(path),
            Self::UnresolvedAlias { .. }
            | Self::DependencyNotDeclared { .. }
            | Self::InvalidModulePath { .. } => None,
        }
    }
}

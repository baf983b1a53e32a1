//! Directory inspection: which package a directory holds and where that package is rooted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::env::{normalize, GoEnvironment};
use super::modfile::{unescape_module_path, ModuleFile, MODULE_FILE};
use super::FileScanner;
use crate::error::{LocateError, Result};
use crate::parsers::GoParser;

/// Literal prefix of vendored import paths.
pub const VENDOR_PREFIX: &str = "vendor/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    LocalWorkspace,
    ModuleDefinition,
    VendoredDependency,
    LegacyPathWorkspace,
    SystemLibraryRoot,
    DependencyCache,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub import_path: String,
    pub directory: PathBuf,
    /// Root the import path is anchored at; always `directory` or one of its ancestors.
    pub package_root: PathBuf,
    pub kind: LocationKind,
    pub package_name: String,
}

impl Location {
    /// Import path of `package_root` itself, e.g. the module path for a module subdirectory.
    pub fn root_import_path(&self) -> String {
        let depth = match self.directory.strip_prefix(&self.package_root) {
            Ok(relative) => relative.components().count(),
            Err(_) => return self.import_path.clone(),
        };
        if depth == 0 || self.import_path.is_empty() {
            return self.import_path.clone();
        }

        let segments: Vec<&str> = self.import_path.split('/').collect();
        segments[..segments.len().saturating_sub(depth)].join("/")
    }
}

/// Anchor found while walking up: the kind, the import path of the anchor directory and its root.
struct Anchor {
    kind: LocationKind,
    import_path: String,
    package_root: PathBuf,
}

/// Resolves a `vendor/...` literal without touching the filesystem.
pub fn inspect_vendored(path: &Path) -> Option<Location> {
    let literal = path.to_str()?;
    let import_path = literal.strip_prefix(VENDOR_PREFIX)?.trim_end_matches('/');
    let package_name = import_path.rsplit('/').next().unwrap_or_default().to_string();

    Some(Location {
        import_path: import_path.to_string(),
        directory: normalize(path),
        package_root: normalize(Path::new(VENDOR_PREFIX)),
        kind: LocationKind::VendoredDependency,
        package_name,
    })
}

pub fn inspect_directory(env: &GoEnvironment, directory: &Path) -> Result<Location> {
    if let Some(location) = inspect_vendored(directory) {
        return Ok(location);
    }
    if directory.as_os_str().is_empty() {
        return Err(LocateError::undetectable(directory));
    }

    let directory = normalize(directory);
    if !directory.is_dir() {
        return Err(LocateError::not_a_directory(directory));
    }

    // Base names collected on the way up, innermost first
    let mut segments: Vec<String> = Vec::new();
    let mut current = directory.as_path();

    let anchor = loop {
        if let Some(anchor) = match_anchor(env, current)? {
            break anchor;
        }
        let (Some(name), Some(parent)) = (current.file_name(), current.parent()) else {
            return Err(LocateError::undetectable(&directory));
        };
        segments.push(name.to_string_lossy().into_owned());
        current = parent;
    };

    segments.reverse();
    let import_path = match (anchor.import_path.is_empty(), segments.is_empty()) {
        (_, true) => anchor.import_path,
        (true, false) => segments.join("/"),
        (false, false) => format!("{}/{}", anchor.import_path, segments.join("/")),
    };
    trace!("{} is {:?} {}", directory.display(), anchor.kind, import_path);

    let package_name = guess_package_name(&directory);
    Ok(Location {
        import_path,
        directory,
        package_root: anchor.package_root,
        kind: anchor.kind,
        package_name,
    })
}

fn match_anchor(env: &GoEnvironment, dir: &Path) -> Result<Option<Anchor>> {
    if env.is_goroot_src(dir) {
        return Ok(Some(Anchor {
            kind: LocationKind::SystemLibraryRoot,
            import_path: String::new(),
            package_root: dir.to_path_buf(),
        }));
    }
    if env.is_gopath_src(dir) {
        return Ok(Some(Anchor {
            kind: LocationKind::LegacyPathWorkspace,
            import_path: String::new(),
            package_root: dir.to_path_buf(),
        }));
    }
    if let Some(anchor) = match_mod_cache(env, dir)? {
        return Ok(Some(anchor));
    }

    let module_file = dir.join(MODULE_FILE);
    if module_file.is_file() {
        let module = ModuleFile::read(&module_file)?;
        debug!("{} declares module {}", dir.display(), module.module);
        return Ok(Some(Anchor {
            kind: LocationKind::ModuleDefinition,
            import_path: module.module,
            package_root: dir.to_path_buf(),
        }));
    }

    if env.is_workspace_root(dir) {
        return Ok(Some(Anchor {
            kind: LocationKind::LocalWorkspace,
            import_path: String::new(),
            package_root: dir.to_path_buf(),
        }));
    }

    Ok(None)
}

/// `<cache>/github.com/!burnt!sushi/toml@v1.3.2/internal` → `github.com/BurntSushi/toml/internal`.
fn match_mod_cache(env: &GoEnvironment, dir: &Path) -> Result<Option<Anchor>> {
    let Ok(relative) = dir.strip_prefix(&env.mod_cache) else {
        return Ok(None);
    };
    let components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let Some(versioned) = components.iter().position(|c| c.contains('@')) else {
        return Ok(None);
    };

    let mut escaped: Vec<&str> = components[..versioned].iter().map(String::as_str).collect();
    let (module_tail, _version) = components[versioned]
        .split_once('@')
        .unwrap_or((components[versioned].as_str(), ""));
    escaped.push(module_tail);

    let module = unescape_module_path(&escaped.join("/"))?;
    let import_path = std::iter::once(module.as_str())
        .chain(components[versioned + 1..].iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("/");

    let package_root = components[..=versioned]
        .iter()
        .fold(env.mod_cache.clone(), |root, c| root.join(c));

    Ok(Some(Anchor {
        kind: LocationKind::DependencyCache,
        import_path,
        package_root,
    }))
}

/// Package clause of the first parseable source file, else the directory's base name.
pub fn guess_package_name(directory: &Path) -> String {
    let directory = normalize(directory);
    let guess = directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Ok(files) = FileScanner::new().source_files(&directory) else {
        return guess;
    };
    let Ok(mut parser) = GoParser::new() else {
        return guess;
    };

    files
        .iter()
        .filter_map(|file| parser.parse_file(file).ok())
        .find_map(|parsed| parsed.package)
        .unwrap_or(guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendored_literal_needs_no_filesystem() {
        let location = inspect_vendored(Path::new("vendor/foo/bar")).unwrap();
        assert_eq!(location.import_path, "foo/bar");
        assert_eq!(location.kind, LocationKind::VendoredDependency);
        assert_eq!(location.package_name, "bar");
        assert!(location.directory.starts_with(&location.package_root));
        assert_eq!(location.root_import_path(), "");

        assert!(inspect_vendored(Path::new("vendors/foo")).is_none());
    }

    #[test]
    fn root_import_path_strips_subdirectories() {
        let location = Location {
            import_path: "example.com/app/internal/db".to_string(),
            directory: PathBuf::from("/work/app/internal/db"),
            package_root: PathBuf::from("/work/app"),
            kind: LocationKind::ModuleDefinition,
            package_name: "db".to_string(),
        };
        assert_eq!(location.root_import_path(), "example.com/app");
    }
}

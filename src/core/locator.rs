//! Import path → source directory resolution.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::env::GoEnvironment;
use super::location::{guess_package_name, inspect_directory, Location, LocationKind};
use super::modfile::{ModuleFile, MODULE_FILE};
use crate::error::{LocateError, Result};

/// `github.com/acme/shop/cmd` relates to `github.com/acme/shop`
/// but `github.com/acme/shopping` does not.
pub fn relates_to_package(root_pkg: &str, suspect_pkg: &str) -> bool {
    if root_pkg == suspect_pkg {
        return true;
    }
    let root_parts: Vec<&str> = root_pkg.split('/').collect();
    let suspect_parts: Vec<&str> = suspect_pkg.split('/').collect();
    if suspect_parts.len() < root_parts.len() {
        return false;
    }
    root_parts
        .iter()
        .zip(&suspect_parts)
        .all(|(root, suspect)| root == suspect)
}

/// Segments of `suspect_pkg` below `root_pkg`, or empty when they do not relate.
pub fn tail(root_pkg: &str, suspect_pkg: &str) -> String {
    if root_pkg == suspect_pkg || !relates_to_package(root_pkg, suspect_pkg) {
        return String::new();
    }
    let depth = root_pkg.split('/').count();
    suspect_pkg
        .split('/')
        .skip(depth)
        .collect::<Vec<_>>()
        .join("/")
}

fn join_segments(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |dir, segment| dir.join(segment))
}

/// Stateless locator over one [`GoEnvironment`]; every call is a pure function of its inputs
/// and the filesystem.
#[derive(Debug, Clone)]
pub struct PackageLocator {
    env: GoEnvironment,
}

impl PackageLocator {
    pub fn new(env: GoEnvironment) -> Self {
        Self { env }
    }

    pub fn from_env() -> Self {
        Self::new(GoEnvironment::from_env())
    }

    pub fn env(&self) -> &GoEnvironment {
        &self.env
    }

    pub fn inspect(&self, directory: &Path) -> Result<Location> {
        inspect_directory(&self.env, directory)
    }

    pub fn guess_package_name(&self, directory: &Path) -> String {
        guess_package_name(directory)
    }

    /// Directory that defines `import_path` as seen from `work_dir`.
    pub fn locate_package_dir(&self, import_path: &str, work_dir: &Path) -> Result<PathBuf> {
        Ok(self.resolve(import_path, work_dir)?.directory)
    }

    pub fn resolve(&self, import_path: &str, work_dir: &Path) -> Result<Location> {
        let root_info = self.inspect(work_dir)?;
        let root_import = root_info.root_import_path();

        // Same workspace: the package lives below the working package's root
        if relates_to_package(&root_import, import_path) {
            let directory = join_segments(&root_info.package_root, &tail(&root_import, import_path));
            debug!("{} resolved inside workspace {}", import_path, root_import);
            let package_name = guess_package_name(&directory);
            return Ok(Location {
                import_path: import_path.to_string(),
                directory,
                package_root: root_info.package_root,
                kind: root_info.kind,
                package_name,
            });
        }

        if import_path.is_empty() {
            return Err(LocateError::not_declared(import_path));
        }

        let stdlib_dir = join_segments(&self.env.goroot_src, import_path);
        if stdlib_dir.is_dir() {
            debug!("{} resolved in standard library", import_path);
            return self.inspect(&stdlib_dir);
        }

        if root_info.kind == LocationKind::ModuleDefinition {
            if let Some(location) = self.resolve_in_modules(import_path, &root_info.package_root)? {
                return Ok(location);
            }
        }

        let legacy_dir = join_segments(&self.env.gopath_src, import_path);
        if legacy_dir.is_dir() {
            debug!("{} resolved in legacy workspace", import_path);
            return self.inspect(&legacy_dir);
        }

        Err(LocateError::not_declared(import_path))
    }

    /// Looks `import_path` up in the requirements of the module rooted at `module_root`.
    fn resolve_in_modules(&self, import_path: &str, module_root: &Path) -> Result<Option<Location>> {
        let module = ModuleFile::read(&module_root.join(MODULE_FILE))?;
        let candidates = module.related_requirements(import_path);
        if candidates.is_empty() {
            debug!("{} not required by {}", import_path, module.module);
            return Ok(None);
        }

        // Nested modules first; a parent module is tried when the nested one is not downloaded
        for requirement in candidates {
            let package_root = join_segments(&self.env.mod_cache, &requirement.cache_dir_name()?);
            let directory = join_segments(&package_root, &tail(&requirement.path, import_path));
            if !directory.is_dir() {
                debug!(
                    "{} required via {}@{} but {} is missing",
                    import_path,
                    requirement.path,
                    requirement.version,
                    directory.display()
                );
                continue;
            }

            let package_name = guess_package_name(&directory);
            return Ok(Some(Location {
                import_path: import_path.to_string(),
                directory,
                package_root,
                kind: LocationKind::DependencyCache,
                package_name,
            }));
        }
        Ok(None)
    }
}

//! Toolchain roots, resolved once and passed to every inspection.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::debug;

const GOROOT_FALLBACKS: &[&str] = &["/usr/local/go", "/usr/lib/go", "/opt/go"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoEnvironment {
    /// Standard library sources, `$GOROOT/src`.
    pub goroot_src: PathBuf,
    /// Legacy flat workspace, `$GOPATH/src`.
    pub gopath_src: PathBuf,
    /// Versioned module cache, `$GOMODCACHE` or `$GOPATH/pkg/mod`.
    pub mod_cache: PathBuf,
    /// Project root that has no module file; its import path is empty.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

impl GoEnvironment {
    /// Roots derived from a GOROOT and a single GOPATH entry.
    pub fn new(goroot: impl AsRef<Path>, gopath: impl AsRef<Path>) -> Self {
        let gopath = normalize(gopath.as_ref());
        Self {
            goroot_src: normalize(&goroot.as_ref().join("src")),
            gopath_src: gopath.join("src"),
            mod_cache: gopath.join("pkg").join("mod"),
            workspace_root: None,
        }
    }

    pub fn with_goroot(mut self, goroot: impl AsRef<Path>) -> Self {
        self.goroot_src = normalize(&goroot.as_ref().join("src"));
        self
    }

    /// Replaces the legacy workspace and module cache with those of `gopath`. A path list
    /// contributes its first entry only.
    pub fn with_gopath(mut self, gopath: impl AsRef<Path>) -> Self {
        let Some(first) = first_path_entry(gopath.as_ref().as_os_str()) else {
            return self;
        };
        let gopath = normalize(&first);
        self.gopath_src = gopath.join("src");
        self.mod_cache = gopath.join("pkg").join("mod");
        self
    }

    pub fn with_mod_cache(mut self, mod_cache: impl AsRef<Path>) -> Self {
        self.mod_cache = normalize(mod_cache.as_ref());
        self
    }

    pub fn with_workspace_root(mut self, root: impl AsRef<Path>) -> Self {
        self.workspace_root = Some(normalize(root.as_ref()));
        self
    }

    pub fn from_env() -> Self {
        let goroot = find_goroot();
        let gopath = find_gopath();
        debug!("GOROOT={} GOPATH={}", goroot.display(), gopath.display());

        let env = Self::new(goroot, gopath);
        match std::env::var_os("GOMODCACHE").filter(|v| !v.is_empty()) {
            Some(cache) => env.with_mod_cache(PathBuf::from(cache)),
            None => env,
        }
    }

    pub fn is_goroot_src(&self, dir: &Path) -> bool {
        dir == self.goroot_src
    }

    pub fn is_gopath_src(&self, dir: &Path) -> bool {
        dir == self.gopath_src
    }

    pub fn is_workspace_root(&self, dir: &Path) -> bool {
        self.workspace_root.as_deref() == Some(dir)
    }
}

fn find_goroot() -> PathBuf {
    if let Some(goroot) = std::env::var_os("GOROOT").filter(|v| !v.is_empty()) {
        return PathBuf::from(goroot);
    }

    if let Ok(output) = Command::new("go").args(["env", "GOROOT"]).output() {
        if output.status.success() {
            let goroot = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !goroot.is_empty() {
                return PathBuf::from(goroot);
            }
        }
    }

    GOROOT_FALLBACKS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.join("src").is_dir())
        .unwrap_or_else(|| PathBuf::from(GOROOT_FALLBACKS[0]))
}

fn find_gopath() -> PathBuf {
    if let Some(first) = std::env::var_os("GOPATH").and_then(|gopath| first_path_entry(&gopath)) {
        return first;
    }

    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_default();
    home.join("go")
}

/// Only the first non-empty entry of a GOPATH-style list is consulted.
fn first_path_entry(list: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(list).find(|p| !p.as_os_str().is_empty())
}

/// Absolute, lexically cleaned path: `.` dropped, `..` applied, no filesystem access
/// beyond reading the current directory for relative input.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_roots_from_gopath() {
        let env = GoEnvironment::new("/opt/go", "/home/dev/go/");
        assert_eq!(env.goroot_src, PathBuf::from("/opt/go/src"));
        assert_eq!(env.gopath_src, PathBuf::from("/home/dev/go/src"));
        assert_eq!(env.mod_cache, PathBuf::from("/home/dev/go/pkg/mod"));
        assert!(env.workspace_root.is_none());

        let env = env.with_mod_cache("/var/cache/gomod");
        assert_eq!(env.mod_cache, PathBuf::from("/var/cache/gomod"));
    }

    #[test]
    fn overrides_take_the_first_gopath_entry() {
        let list = std::env::join_paths(["/first/go", "/second/go"]).unwrap();
        let env = GoEnvironment::new("/opt/go", "/home/dev/go")
            .with_goroot("/usr/lib/go")
            .with_gopath(PathBuf::from(list));
        assert_eq!(env.goroot_src, PathBuf::from("/usr/lib/go/src"));
        assert_eq!(env.gopath_src, PathBuf::from("/first/go/src"));
        assert_eq!(env.mod_cache, PathBuf::from("/first/go/pkg/mod"));

        // An empty list leaves the roots alone
        let env = env.with_gopath("");
        assert_eq!(env.gopath_src, PathBuf::from("/first/go/src"));
    }

    #[test]
    fn normalize_applies_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
        assert!(normalize(Path::new("rel/dir")).is_absolute());
    }
}

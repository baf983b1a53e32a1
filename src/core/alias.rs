//! Qualifier → package resolution for one source file's imports.

use std::path::Path;
use tracing::trace;

use super::location::Location;
use super::locator::PackageLocator;
use crate::error::{LocateError, Result};
use crate::parsers::{GoFile, ImportDeclaration};

impl PackageLocator {
    /// Resolves `alias` as used in `source_file`: `lala` in `import lala "net/http"`
    /// resolves to `net/http`.
    pub fn resolve_alias(&self, alias: &str, source_file: &GoFile, work_dir: &Path) -> Result<Location> {
        self.resolve_alias_in(alias, &source_file.imports, work_dir)
    }

    pub fn resolve_alias_in(
        &self,
        alias: &str,
        imports: &[ImportDeclaration],
        work_dir: &Path,
    ) -> Result<Location> {
        if alias.is_empty() {
            return Err(LocateError::unresolved_alias(alias));
        }

        // An explicit rename wins over any natural package name
        if let Some(import) = imports
            .iter()
            .find(|import| import.alias.as_deref() == Some(alias))
        {
            return self.resolve(&import.raw_path, work_dir);
        }

        for import in imports {
            let location = self.resolve(&import.raw_path, work_dir)?;
            if location.package_name == alias {
                return Ok(location);
            }
            trace!("{} is package {}, not {}", import.raw_path, location.package_name, alias);
        }

        Err(LocateError::unresolved_alias(alias))
    }
}

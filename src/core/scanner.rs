use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SOURCE_EXTENSION: &str = "go";

pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    /// Go source files directly inside `directory`, sorted by file name.
    pub fn source_files(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

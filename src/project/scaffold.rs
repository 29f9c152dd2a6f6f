use std::path::{Path, PathBuf};

use tracing::debug;

use super::templates::ProjectTemplate;
use super::{
    README_FILE, STARTER_SOURCE, WATCHED_DIRS, dir_manifest_path, root_manifest_path,
};
use crate::error::{Error, Result};
use crate::utils::fs::FileSystem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub created_dirs: Vec<PathBuf>,
    pub written_files: Vec<PathBuf>,
}

/// Lay out `bin`, `lib` and `tests` under `root` and write the generated files.
///
/// Existing directories are kept; generated files are always overwritten.
pub fn initialize(
    fs: &dyn FileSystem,
    root: &Path,
    template: &ProjectTemplate,
) -> Result<ScaffoldReport> {
    let mut report = ScaffoldReport::default();

    if fs.ensure_dir(root).map_err(|e| Error::fs(root, e))? {
        report.created_dirs.push(root.to_path_buf());
    }
    for dir in WATCHED_DIRS {
        let path = root.join(dir);
        if fs.ensure_dir(&path).map_err(|e| Error::fs(&path, e))? {
            report.created_dirs.push(path);
        } else {
            debug!(dir, "directory already present");
        }
    }

    let mut write = |path: PathBuf, contents: &str| -> Result<()> {
        fs.write(&path, contents).map_err(|e| Error::fs(&path, e))?;
        debug!(path = %path.display(), "wrote");
        report.written_files.push(path);
        Ok(())
    };

    write(root_manifest_path(root), &template.root_manifest())?;
    write(root.join("bin").join(STARTER_SOURCE), template.starter_source())?;
    for dir in WATCHED_DIRS {
        write(dir_manifest_path(root, dir), &template.dir_manifest(dir))?;
    }
    write(root.join(README_FILE), &template.readme())?;

    Ok(report)
}

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Edit, upsert_build_rule, upsert_file_list};
use crate::error::{Error, Result, SyncWarning};
use crate::project::{
    SourceFilter, WATCHED_DIRS, dir_manifest_path, list_variable_name, root_manifest_path,
};
use crate::utils::fs::FileSystem;

/// Outcome for one watched directory whose manifest was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySync {
    pub dir: &'static str,
    pub manifest: PathBuf,
    pub variable: String,
    pub files: Vec<String>,
    pub edit: Edit,
    /// False when the manifest already said exactly this and was not rewritten.
    pub changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub directories: Vec<DirectorySync>,
    /// What the root build rule references, in directory order: one variable
    /// per existing manifest, including ones that could not be read.
    pub variables: Vec<String>,
    pub warnings: Vec<SyncWarning>,
    pub root_updated: bool,
}

/// Bring every directory manifest's file list and the root build rule in line
/// with the source files currently on disk.
///
/// Missing manifests and manifests that are not UTF-8 are reported as
/// warnings; any other read, list or write error stops the pass, leaving
/// whatever was already written in place.
pub fn synchronize(fs: &dyn FileSystem, root: &Path, sources: &SourceFilter) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for dir in WATCHED_DIRS {
        let manifest = dir_manifest_path(root, dir);
        if !fs.exists(&manifest) {
            debug!(dir, path = %manifest.display(), "manifest missing, skipping directory");
            report.warnings.push(SyncWarning::ManifestMissing {
                dir,
                path: manifest,
            });
            continue;
        }

        let variable = list_variable_name(dir);
        report.variables.push(variable.clone());

        let current = match fs.read_to_string(&manifest) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                debug!(dir, path = %manifest.display(), "manifest is not UTF-8, skipping directory");
                report.warnings.push(SyncWarning::ManifestNotUtf8 { path: manifest });
                continue;
            }
            Err(e) => return Err(Error::fs(&manifest, e)),
        };

        let dir_path = root.join(dir);
        let listing = fs
            .list_files(&dir_path)
            .map_err(|e| Error::fs(&dir_path, e))?;
        let files = sources.select(listing);

        let (updated, edit) = upsert_file_list(&current, &variable, &files);
        let changed = updated != current;
        if changed {
            fs.write(&manifest, &updated)
                .map_err(|e| Error::fs(&manifest, e))?;
        }
        debug!(dir, %variable, files = files.len(), ?edit, changed, "file list synced");

        report.directories.push(DirectorySync {
            dir,
            manifest,
            variable,
            files,
            edit,
            changed,
        });
    }

    report.root_updated = sync_root(fs, root, &report.variables, &mut report.warnings)?;
    info!(
        directories = report.directories.len(),
        warnings = report.warnings.len(),
        root_updated = report.root_updated,
        "synchronization finished"
    );
    Ok(report)
}

fn sync_root(
    fs: &dyn FileSystem,
    root: &Path,
    variables: &[String],
    warnings: &mut Vec<SyncWarning>,
) -> Result<bool> {
    let path = root_manifest_path(root);
    if !fs.exists(&path) {
        warnings.push(SyncWarning::RootManifestMissing { path });
        return Ok(false);
    }

    let current = match fs.read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warnings.push(SyncWarning::ManifestNotUtf8 { path });
            return Ok(false);
        }
        Err(e) => return Err(Error::fs(&path, e)),
    };
    let Some((updated, edit)) = upsert_build_rule(&current, variables) else {
        debug!(path = %path.display(), "no build rule or anchor in root manifest");
        warnings.push(SyncWarning::RootRuleNotFound {
            path,
            anchor: super::BUILD_RULE_ANCHOR,
        });
        return Ok(false);
    };

    if updated == current {
        return Ok(false);
    }
    fs.write(&path, &updated).map_err(|e| Error::fs(&path, e))?;
    debug!(?edit, "root build rule rewritten");
    Ok(true)
}

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use tracing::debug;

use crate::config::{Overrides, ProjectSettings};
use crate::error::Error;
use crate::host::Host;
use crate::manifest::sync::synchronize;
use crate::project::MANIFEST_FILE;
use crate::project::scaffold::initialize;
use crate::utils::fs::FileSystem;

pub const CREATE_PROJECT_STRUCTURE: &str = "cmkit.createProjectStructure";
pub const UPDATE_BUILD_MANIFESTS: &str = "cmkit.updateBuildManifests";

/// What a command handler gets to work with.
pub struct CommandContext<'a> {
    pub host: &'a dyn Host,
    pub fs: &'a dyn FileSystem,
    pub overrides: &'a Overrides,
}

pub type Handler = fn(&CommandContext<'_>) -> Result<()>;

/// Something commands can be registered with, e.g. an editor's command palette.
pub trait Dispatcher {
    fn register(&mut self, id: &'static str, handler: Handler);
    /// Returns whether `id` was registered.
    fn unregister(&mut self, id: &str) -> bool;
}

/// In-process dispatcher used by the CLI.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<&'static str, Handler>,
}

impl CommandRegistry {
    pub fn dispatch(&self, id: &str, ctx: &CommandContext<'_>) -> Result<()> {
        let Some(handler) = self.handlers.get(id) else {
            bail!("Command `{id}` is not registered.");
        };
        debug!(command = id, "dispatching");
        handler(ctx)
    }
}

impl Dispatcher for CommandRegistry {
    fn register(&mut self, id: &'static str, handler: Handler) {
        self.handlers.insert(id, handler);
    }

    fn unregister(&mut self, id: &str) -> bool {
        self.handlers.remove(id).is_some()
    }
}

pub fn activate(dispatcher: &mut dyn Dispatcher) {
    dispatcher.register(CREATE_PROJECT_STRUCTURE, create_project_structure);
    dispatcher.register(UPDATE_BUILD_MANIFESTS, update_build_manifests);
}

pub fn deactivate(dispatcher: &mut dyn Dispatcher) {
    dispatcher.unregister(CREATE_PROJECT_STRUCTURE);
    dispatcher.unregister(UPDATE_BUILD_MANIFESTS);
}

fn create_project_structure(ctx: &CommandContext<'_>) -> Result<()> {
    let Some(root) = ctx.host.pick_folder() else {
        return Err(Error::NoProjectContext.into());
    };
    let settings = ProjectSettings::load(&root, ctx.overrides)?;
    let report = initialize(ctx.fs, &root, &settings.template)?;
    debug!(
        created = report.created_dirs.len(),
        written = report.written_files.len(),
        "scaffold finished"
    );
    ctx.host.info(&format!(
        "Project structure created successfully at {}",
        root.display()
    ));
    Ok(())
}

fn update_build_manifests(ctx: &CommandContext<'_>) -> Result<()> {
    let Some(root) = ctx.host.project_root() else {
        return Err(Error::NoProjectContext.into());
    };
    let settings = ProjectSettings::load(&root, ctx.overrides)?;
    let report = synchronize(ctx.fs, &root, &settings.sources)?;

    let mut updated = 0;
    for dir in report.directories.iter().filter(|d| d.changed) {
        debug!(dir = dir.dir, edit = ?dir.edit, "manifest rewritten");
        updated += 1;
        ctx.host.info(&format!(
            "Updated {}: {} lists {} source file(s)",
            relative(&root, &dir.manifest).display(),
            dir.variable,
            dir.files.len()
        ));
    }
    if report.root_updated {
        updated += 1;
        ctx.host.info(&format!(
            "Updated {MANIFEST_FILE}: build rule references {}",
            report.variables.join(", ")
        ));
    }
    for warning in &report.warnings {
        ctx.host.warn(&warning.to_string());
    }
    if updated == 0 {
        ctx.host.info("Build manifests already up to date");
    }
    Ok(())
}

fn relative<'p>(root: &Path, path: &'p Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;

    use tempfile::tempdir;

    use super::*;
    use crate::utils::fs::OsFs;

    #[derive(Default)]
    struct RecordingHost {
        folder: Option<PathBuf>,
        root: Option<PathBuf>,
        infos: RefCell<Vec<String>>,
        warnings: RefCell<Vec<String>>,
    }

    impl Host for RecordingHost {
        fn pick_folder(&self) -> Option<PathBuf> {
            self.folder.clone()
        }

        fn project_root(&self) -> Option<PathBuf> {
            self.root.clone()
        }

        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn warn(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            panic!("handlers report errors by returning them, got: {message}");
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::default();
        activate(&mut registry);
        registry
    }

    #[test]
    fn deactivate_removes_both_commands() {
        let mut registry = registry();
        deactivate(&mut registry);

        let host = RecordingHost::default();
        let ctx = CommandContext {
            host: &host,
            fs: &OsFs,
            overrides: &Overrides::default(),
        };
        for id in [CREATE_PROJECT_STRUCTURE, UPDATE_BUILD_MANIFESTS] {
            let err = registry.dispatch(id, &ctx).expect_err("unregistered");
            assert!(err.to_string().contains("not registered"));
        }
        assert!(!registry.unregister(UPDATE_BUILD_MANIFESTS));
    }

    #[test]
    fn unknown_command_is_an_error() {
        let host = RecordingHost::default();
        let ctx = CommandContext {
            host: &host,
            fs: &OsFs,
            overrides: &Overrides::default(),
        };
        let err = registry().dispatch("cmkit.nope", &ctx).expect_err("unknown");
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn commands_without_a_folder_report_no_project_context() {
        let host = RecordingHost::default();
        let ctx = CommandContext {
            host: &host,
            fs: &OsFs,
            overrides: &Overrides::default(),
        };
        let registry = registry();

        for id in [CREATE_PROJECT_STRUCTURE, UPDATE_BUILD_MANIFESTS] {
            let err = registry.dispatch(id, &ctx).expect_err("no folder");
            assert!(matches!(
                err.downcast_ref::<Error>(),
                Some(Error::NoProjectContext)
            ));
        }
        assert!(host.infos.borrow().is_empty());
    }

    #[test]
    fn create_then_update_notifies_the_host() {
        let tmp = tempdir().expect("tempdir");
        let root = tmp.path().to_path_buf();
        let registry = registry();

        let host = RecordingHost {
            folder: Some(root.clone()),
            root: Some(root.clone()),
            ..RecordingHost::default()
        };
        let overrides = Overrides {
            name: Some("Demo".to_string()),
            cxx_standard: None,
        };
        let ctx = CommandContext {
            host: &host,
            fs: &OsFs,
            overrides: &overrides,
        };

        registry
            .dispatch(CREATE_PROJECT_STRUCTURE, &ctx)
            .expect("create");
        assert!(host.infos.borrow()[0].starts_with("Project structure created successfully"));

        fs::remove_file(root.join("lib/CMakeLists.txt")).expect("drop lib manifest");
        registry.dispatch(UPDATE_BUILD_MANIFESTS, &ctx).expect("update");

        let infos = host.infos.borrow();
        assert!(infos.iter().any(|m| m == "Updated tests/CMakeLists.txt: SOURCES_TESTS lists 0 source file(s)"));
        assert!(infos.iter().any(|m| m == "Updated CMakeLists.txt: build rule references SOURCES_BIN, SOURCES_TESTS"));
        let warnings = host.warnings.borrow();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("lib: no manifest"));
    }

    #[test]
    fn update_on_synced_project_says_so() {
        let tmp = tempdir().expect("tempdir");
        let root = tmp.path().to_path_buf();
        initialize(&OsFs, &root, &crate::project::templates::ProjectTemplate::new("Demo"))
            .expect("scaffold");
        synchronize(&OsFs, &root, &Default::default()).expect("first sync");

        let host = RecordingHost {
            root: Some(root),
            ..RecordingHost::default()
        };
        let ctx = CommandContext {
            host: &host,
            fs: &OsFs,
            overrides: &Overrides::default(),
        };
        registry()
            .dispatch(UPDATE_BUILD_MANIFESTS, &ctx)
            .expect("update");

        assert_eq!(*host.infos.borrow(), vec!["Build manifests already up to date".to_string()]);
    }
}

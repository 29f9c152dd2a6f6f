use std::path::PathBuf;

/// The environment a command runs in: where projects come from and where
/// feedback goes.
pub trait Host {
    /// Folder chosen for a new project, `None` if the user picked nothing.
    fn pick_folder(&self) -> Option<PathBuf>;
    /// Root of the project currently open, if any.
    fn project_root(&self) -> Option<PathBuf>;
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Terminal host: folders come from command-line arguments, feedback goes to
/// stdout (info) and stderr (warnings and errors).
#[derive(Debug, Clone)]
pub struct TerminalHost {
    label: &'static str,
    folder: Option<PathBuf>,
    root: Option<PathBuf>,
}

impl TerminalHost {
    pub fn for_new_project(label: &'static str, folder: Option<PathBuf>) -> Self {
        Self {
            label,
            folder,
            root: None,
        }
    }

    pub fn for_open_project(label: &'static str, root: Option<PathBuf>) -> Self {
        Self {
            label,
            folder: None,
            root,
        }
    }
}

impl Host for TerminalHost {
    fn pick_folder(&self) -> Option<PathBuf> {
        self.folder.clone()
    }

    fn project_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("warning ({}): {message}", self.label);
    }

    fn error(&self, message: &str) {
        eprintln!("error ({}): {message}", self.label);
    }
}

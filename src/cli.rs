use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    self, CREATE_PROJECT_STRUCTURE, CommandContext, CommandRegistry, UPDATE_BUILD_MANIFESTS,
};
use crate::config::{Overrides, ProjectSettings};
use crate::error::Error;
use crate::host::{Host, TerminalHost};
use crate::project::MANIFEST_FILE;
use crate::utils::fs::OsFs;
use crate::watch;

/// Root CLI for cmkit
#[derive(Parser)]
#[command(name = "cmkit")]
#[command(about = "Scaffold CMake C++ projects and keep their source lists in sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create bin/, lib/ and tests/ with starter CMakeLists.txt files
    New {
        /// Project folder, created if missing (defaults to the current directory)
        path: Option<PathBuf>,
        /// Name passed to project() (defaults to the folder name)
        #[arg(long)]
        name: Option<String>,
        /// Value for CMAKE_CXX_STANDARD
        #[arg(long)]
        cxx_standard: Option<u16>,
    },
    /// Rewrite per-folder source lists and the root build rule
    Sync {
        /// Project root (defaults to the current directory if it has a CMakeLists.txt)
        #[arg(long, env = "CMKIT_PROJECT_ROOT")]
        root: Option<PathBuf>,
    },
    /// Keep build manifests in sync while source files come and go
    Watch {
        /// Project root (defaults to the current directory if it has a CMakeLists.txt)
        #[arg(long, env = "CMKIT_PROJECT_ROOT")]
        root: Option<PathBuf>,
        /// Quiet period before a burst of changes triggers a sync
        #[arg(long, default_value_t = 300)]
        debounce_ms: u64,
    },
}

/// Dispatch after parse
pub fn run() {
    let cli = Cli::parse();

    let mut registry = CommandRegistry::default();
    commands::activate(&mut registry);

    let code = match cli.command {
        Commands::New {
            path,
            name,
            cxx_standard,
        } => {
            let folder = path.or_else(|| std::env::current_dir().ok());
            let host = TerminalHost::for_new_project("new", folder);
            let overrides = Overrides { name, cxx_standard };
            report(&host, run_command(&registry, &host, &overrides, CREATE_PROJECT_STRUCTURE))
        }
        Commands::Sync { root } => {
            let host = TerminalHost::for_open_project("sync", resolve_project_root(root));
            report(
                &host,
                run_command(&registry, &host, &Overrides::default(), UPDATE_BUILD_MANIFESTS),
            )
        }
        Commands::Watch { root, debounce_ms } => {
            let host = TerminalHost::for_open_project("watch", resolve_project_root(root));
            report(
                &host,
                run_watch(&registry, &host, Duration::from_millis(debounce_ms)),
            )
        }
    };

    commands::deactivate(&mut registry);
    if code != 0 {
        std::process::exit(code);
    }
}

fn run_command(
    registry: &CommandRegistry,
    host: &dyn Host,
    overrides: &Overrides,
    id: &str,
) -> Result<()> {
    let ctx = CommandContext {
        host,
        fs: &OsFs,
        overrides,
    };
    registry.dispatch(id, &ctx)
}

fn run_watch(registry: &CommandRegistry, host: &dyn Host, debounce: Duration) -> Result<()> {
    let Some(root) = host.project_root() else {
        return Err(Error::NoProjectContext.into());
    };
    let overrides = Overrides::default();
    let settings = ProjectSettings::load(&root, &overrides)?;
    let ctx = CommandContext {
        host,
        fs: &OsFs,
        overrides: &overrides,
    };
    watch::run(registry, &ctx, &root, &settings.sources, debounce)
}

fn report(host: &dyn Host, result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            host.error(&format!("{e:#}"));
            1
        }
    }
}

/// An explicit root (flag or env) must be a directory; without one the
/// current directory counts only if it already has a root manifest.
fn resolve_project_root(explicit: Option<PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(root) => Some(root).filter(|r| r.is_dir()),
        None => std::env::current_dir()
            .ok()
            .filter(|cwd| cwd.join(MANIFEST_FILE).is_file()),
    }
}

//! CLI entry point for the repo-local architecture lint.

use std::fmt;
use std::io::{self, Write};
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};

fn main() -> ExitCode {
    let crate_dir = match repo_root() {
        Ok(root) => root.join("crates").join("query-schema"),
        Err(err) => {
            report(&err);
            return ExitCode::FAILURE;
        }
    };
    match architecture_lint::lint_crate_sources(&crate_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &dyn fmt::Display) {
    if let Err(write_err) = writeln!(io::stderr().lock(), "{err}") {
        drop(write_err);
    }
}

#[derive(Debug, Clone, Copy)]
struct RepoRootError;

impl fmt::Display for RepoRootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to locate workspace root (directory containing a workspace Cargo.toml)"
        )
    }
}

impl std::error::Error for RepoRootError {}

fn repo_root() -> Result<Utf8PathBuf, RepoRootError> {
    let from_env = std::env::var("CARGO_WORKSPACE_DIR")
        .ok()
        .map(Utf8PathBuf::from);
    let from_cwd = std::env::current_dir()
        .ok()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok());
    let from_manifest = Some(Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    from_env
        .as_deref()
        .and_then(find_workspace_root)
        .or_else(|| from_cwd.as_deref().and_then(find_workspace_root))
        .or_else(|| from_manifest.as_deref().and_then(find_workspace_root))
        .ok_or(RepoRootError)
}

fn find_workspace_root(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .find(|dir| declares_workspace(dir))
        .map(Utf8Path::to_path_buf)
}

fn declares_workspace(dir: &Utf8Path) -> bool {
    Dir::open_ambient_dir(dir, ambient_authority())
        .and_then(|handle| handle.read_to_string("Cargo.toml"))
        .is_ok_and(|contents| contents.contains("[workspace]"))
}

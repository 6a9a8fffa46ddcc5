//! Repo-local architectural lint for the layered query-schema crate.
//!
//! `query-schema` is built bottom-up: the entity catalogue knows nothing of
//! the validators, the shared walker and error types sit on the catalogue,
//! and each validator layer only reaches downwards. This crate parses the
//! sources with `syn` and enforces that ordering:
//!
//! - `registry` must not depend on any other module of the crate
//! - foundation modules (`error`, `limits`, `walk`, `value`, `isolation`)
//!   must not depend on validator layers
//! - `filter`, `projection`, `payload`, `delete` and `validator` may only
//!   depend on layers below them
//! - no layer may depend on I/O, configuration or process-level crates
//!
//! The lint is executed via `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use syn::visit::Visit;

/// Name the crate under lint uses for absolute self-references.
const CRATE_NAME: &str = "query_schema";

/// Modules that share the foundation layer.
const FOUNDATION_MODULES: [&str; 5] = ["error", "isolation", "limits", "value", "walk"];

/// Crates that perform I/O or own process-level concerns.
const FORBIDDEN_CRATES: [&str; 6] = [
    "cap_std",
    "clap",
    "ortho_config",
    "query_check",
    "tempfile",
    "tracing_subscriber",
];

/// Standard library modules that touch the outside world.
const FORBIDDEN_STD_MODULES: [&str; 4] = ["env", "fs", "net", "process"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to the crate's `src` directory.
    pub file: Utf8PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    Io(io::Error),
    /// Rust source parsing failed.
    Parse {
        /// File that failed to parse.
        file: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error while linting architecture: {err}"),
            Self::Parse { file, message } => write!(
                f,
                "Failed to parse Rust source while linting architecture ({file}): {message}"
            ),
            Self::Violations(violations) => {
                writeln!(f, "Architecture boundary violations:")?;
                for violation in violations {
                    writeln!(f, "- {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Lint the query-schema sources on disk.
///
/// `crate_dir` must be the `crates/query-schema/` directory.
///
/// # Errors
///
/// Returns an error when sources cannot be read or parsed, or when any
/// layering rule is broken.
pub fn lint_crate_sources(crate_dir: &Utf8Path) -> Result<(), ArchitectureLintError> {
    let src_dir = Dir::open_ambient_dir(crate_dir.join("src"), ambient_authority())?;
    let mut sources = Vec::new();
    collect_sources_under(&src_dir, Utf8Path::new(""), &mut sources)?;
    lint_sources(&sources)
}

/// Lint the provided Rust sources. Intended for unit and behaviour tests.
///
/// # Errors
///
/// Returns an error when a file belongs to no known layer, fails to parse or
/// breaks a layering rule.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();

    for source in sources {
        let layer = ModuleLayer::infer_from_path(&source.file).ok_or_else(|| {
            ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: "unable to infer module layer from file path".to_owned(),
            }
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(lint_parsed_source(&source.file, layer, &parsed));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to the crate's `src` directory.
    pub file: Utf8PathBuf,
    /// Source text.
    pub contents: String,
}

/// Layers from the bottom of the crate upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ModuleLayer {
    Registry,
    Foundation,
    Filter,
    Projection,
    Payload,
    Delete,
    Validator,
}

impl ModuleLayer {
    fn infer_from_path(relative_path: &Utf8Path) -> Option<Self> {
        let first = relative_path.components().next()?.as_str();
        Self::from_module(first.strip_suffix(".rs").unwrap_or(first))
    }

    fn from_module(module: &str) -> Option<Self> {
        match module {
            "registry" => Some(Self::Registry),
            "filter" => Some(Self::Filter),
            "projection" => Some(Self::Projection),
            "payload" => Some(Self::Payload),
            "delete" => Some(Self::Delete),
            "validator" => Some(Self::Validator),
            other if FOUNDATION_MODULES.contains(&other) => Some(Self::Foundation),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Foundation => "foundation",
            Self::Filter => "filter",
            Self::Projection => "projection",
            Self::Payload => "payload",
            Self::Delete => "delete",
            Self::Validator => "validator",
        }
    }

    /// Whether code in `self` may name modules of `other`.
    fn may_depend_on(self, other: Self) -> bool {
        other <= self
    }
}

fn lint_parsed_source(file: &Utf8Path, layer: ModuleLayer, parsed: &syn::File) -> Vec<Violation> {
    let mut collector = PathCollector::default();
    collector.visit_file(parsed);

    let mut messages = BTreeSet::new();
    for segments in &collector.paths {
        if let Some(root) = internal_module_root(segments) {
            let target = ModuleLayer::from_module(root);
            if target.is_some_and(|target| !layer.may_depend_on(target)) {
                messages.insert(format!(
                    "{} module must not depend on crate::{root}",
                    layer.name()
                ));
            }
        }

        if let Some(root) = forbidden_external_crate_root(segments) {
            messages.insert(format!(
                "{} module must not depend on external crate `{root}`",
                layer.name()
            ));
        }

        if let Some(module) = forbidden_std_module(segments) {
            messages.insert(format!(
                "{} module must not depend on `std::{module}`",
                layer.name()
            ));
        }
    }

    messages
        .into_iter()
        .map(|message| Violation {
            file: file.to_owned(),
            message,
        })
        .collect()
}

fn is_relative_module_segment(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

fn is_module_name(segment: &str) -> bool {
    ModuleLayer::from_module(segment).is_some()
}

fn internal_module_root(segments: &[String]) -> Option<&str> {
    let first = segments.first()?.as_str();
    // A bare single-segment path is a local binding, not a module reference.
    if is_module_name(first) && segments.len() > 1 {
        return Some(first);
    }
    let start_index = match first {
        "crate" | "self" | "super" => segments
            .iter()
            .position(|segment| !is_relative_module_segment(segment.as_str()))?,
        CRATE_NAME => 1,
        _ => return None,
    };
    segments.get(start_index).map(String::as_str)
}

fn forbidden_external_crate_root(segments: &[String]) -> Option<&'static str> {
    let root = segments.first()?.as_str();
    FORBIDDEN_CRATES
        .iter()
        .find(|forbidden| **forbidden == root)
        .copied()
}

fn forbidden_std_module(segments: &[String]) -> Option<&'static str> {
    let [root, module, ..] = segments else {
        return None;
    };
    if root != "std" {
        return None;
    }
    FORBIDDEN_STD_MODULES
        .iter()
        .find(|forbidden| **forbidden == module.as_str())
        .copied()
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn record_path(&mut self, path: &syn::Path) {
        let segments = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>();
        if segments.is_empty() {
            return;
        }
        self.paths.insert(segments);
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                let mut next = prefix;
                next.push(path.ident.to_string());
                self.record_use_tree(&path.tree, next);
            }
            syn::UseTree::Name(name) => {
                let mut segments = prefix;
                segments.push(name.ident.to_string());
                self.paths.insert(segments);
            }
            syn::UseTree::Rename(rename) => {
                let mut segments = prefix;
                segments.push(rename.ident.to_string());
                self.paths.insert(segments);
            }
            syn::UseTree::Glob(_) => {
                let mut segments = prefix;
                segments.push("*".to_owned());
                self.paths.insert(segments);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        self.record_path(node);
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, Vec::new());
    }
}

/// Walks `dir`, collecting every `.rs` file that belongs to a known layer.
///
/// `lib.rs` and other crate-root files outside the layers are skipped.
fn collect_sources_under(
    dir: &Dir,
    relative: &Utf8Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in dir.entries()? {
        let entry = entry?;
        let name = entry.file_name().into_string().map_err(|name| {
            ArchitectureLintError::Parse {
                file: relative.to_owned(),
                message: format!("non UTF-8 file name {name:?}"),
            }
        })?;
        let path = relative.join(&name);
        if entry.file_type()?.is_dir() {
            if relative.as_str().is_empty() && ModuleLayer::from_module(&name).is_none() {
                continue;
            }
            collect_sources_under(&entry.open_dir()?, &path, sources)?;
            continue;
        }

        if path.extension() != Some("rs") || ModuleLayer::infer_from_path(&path).is_none() {
            continue;
        }

        let contents = dir.read_to_string(&name)?;
        sources.push(LintSource {
            file: path,
            contents,
        });
    }
    sources.sort_by(|left, right| left.file.cmp(&right.file));
    Ok(())
}

#[cfg(test)]
mod tests;

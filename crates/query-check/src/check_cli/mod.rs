//! CLI support for checking query documents.
//!
//! The binary parses [`CliArgs`], loads limits and delegates to
//! [`check`], so the whole flow can be exercised in tests without spawning
//! a process.

mod error;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use query_schema::registry::Entity;
use query_schema::{Operation, QueryValidator, ValidatedQuery, ValidationError, ValidationLimits};
use serde_json::Value;
use tracing::{debug, info};

pub use error::CliError;

/// `query-check` command arguments.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "query-check",
    about = "Validate a JSON query document against the entity catalogue",
    version
)]
pub struct CliArgs {
    /// Entity the document applies to, e.g. `Bookmark`.
    #[arg(long, value_name = "entity")]
    pub entity: Entity,
    /// Operation to validate as, e.g. `where` or `find-many`.
    #[arg(long, value_name = "operation")]
    pub operation: Operation,
    /// Path to the JSON document.
    #[arg(long, value_name = "path")]
    pub input: Utf8PathBuf,
    /// Pretty-print the validated structure.
    #[arg(long)]
    pub pretty: bool,
}

/// Reads and validates the document named by `args`.
///
/// # Errors
///
/// Returns [`CliError::Read`] or [`CliError::InvalidJson`] when the input
/// cannot be loaded and [`CliError::Validation`] when it is rejected.
///
/// # Example
///
/// ```
/// use cap_std::{ambient_authority, fs::Dir};
/// use clap::Parser;
/// use query_check::check_cli::{CliArgs, check};
/// use query_schema::ValidationLimits;
///
/// let temp = tempfile::tempdir().expect("temp dir");
/// let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
/// dir.write("filter.json", r#"{"archived": false}"#).expect("write input");
/// let input = temp.path().join("filter.json");
///
/// let args = CliArgs::try_parse_from([
///     "query-check",
///     "--entity",
///     "Bookmark",
///     "--operation",
///     "where",
///     "--input",
///     input.to_str().expect("utf-8 path"),
/// ])
/// .expect("parse args");
///
/// assert!(check(&args, ValidationLimits::default()).is_ok());
/// ```
pub fn check(args: &CliArgs, limits: ValidationLimits) -> Result<ValidatedQuery, CliError> {
    let document = read_document(&args.input)?;
    info!(
        entity = %args.entity,
        operation = %args.operation,
        input = %args.input,
        "checking query document"
    );
    let validated = QueryValidator::new(limits).validate(args.operation, args.entity, &document)?;
    Ok(validated)
}

/// Reads a JSON document through a capability on its parent directory.
///
/// # Errors
///
/// Returns [`CliError::Read`] when the file cannot be read and
/// [`CliError::InvalidJson`] when it does not parse.
pub fn read_document(path: &Utf8Path) -> Result<Value, CliError> {
    let read_error = |message: String| CliError::Read {
        path: path.to_owned(),
        message,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error("input path must name a file".to_owned()))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| read_error(error.to_string()))?;
    let contents = dir
        .read_to_string(file_name)
        .map_err(|error| read_error(error.to_string()))?;
    debug!(path = %path, bytes = contents.len(), "read query document");
    serde_json::from_str(&contents).map_err(|error| CliError::InvalidJson {
        path: path.to_owned(),
        message: error.to_string(),
    })
}

/// Renders a validated structure as JSON.
///
/// # Errors
///
/// Returns [`CliError::Render`] if serialisation fails.
pub fn render(validated: &ValidatedQuery, pretty: bool) -> Result<String, CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(validated)
    } else {
        serde_json::to_string(validated)
    };
    rendered.map_err(|error| CliError::Render {
        message: error.to_string(),
    })
}

/// Renders a rejection as the structured JSON error body.
///
/// # Example
///
/// ```
/// use query_check::check_cli::failure_report;
/// use query_schema::{FieldPath, ValidationError, ValidationErrorKind};
///
/// let error = ValidationError::new(
///     FieldPath::root().key("colour"),
///     ValidationErrorKind::UnknownArgument { argument: "colour".to_owned() },
/// );
///
/// assert!(failure_report(&error).contains("\"code\":\"unknown_argument\""));
/// ```
#[must_use]
pub fn failure_report(error: &ValidationError) -> String {
    error.details().to_string()
}

#[cfg(test)]
mod tests;

//! Capability-based filesystem helpers for query-check tests.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes `contents` to a fresh directory under `target/query-check-tests`.
///
/// # Errors
///
/// Returns any filesystem errors encountered while creating the directory or
/// writing the file.
pub fn write_document(file_name: &str, contents: &str) -> io::Result<Utf8PathBuf> {
    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir_name = format!("documents-{}-{counter}", std::process::id());
    let dir = Utf8PathBuf::from("target")
        .join("query-check-tests")
        .join(dir_name);
    let root = Dir::open_ambient_dir(".", ambient_authority())?;
    root.create_dir_all(&dir)?;
    root.write(dir.join(file_name), contents)?;
    Ok(dir.join(file_name))
}

/// Path of a document that was never written.
#[must_use]
pub fn missing_document(file_name: &str) -> Utf8PathBuf {
    Utf8Path::new("target")
        .join("query-check-tests")
        .join("absent")
        .join(file_name)
}

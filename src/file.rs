use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Creates `path` (truncating an existing file) and writes `text` into it
pub fn write_file(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Returns `true` if `path` exists and is a file rather than a directory
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path)
        .map(|meta| !meta.is_dir())
        .unwrap_or(false)
}

/// Reads the whole file at `path` into a string
pub fn try_read_file(path: impl AsRef<Path>) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Reads the whole file at `path` into a string.
///
/// # Panics
///
/// Panics if the file is missing or unreadable. Check [`file_exists`] first.
pub fn read_file(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match try_read_file(path) {
        Ok(content) => content,
        Err(e) => panic!("cannot read file {}: {}", path.display(), e),
    }
}

//! Best score kept on disk between sessions.

use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};

/// Reads the stored highscore; a missing file counts as zero.
pub(crate) fn load(path: &Path) -> Result<u32> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(0),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read highscore at {}", path.display()))
        }
    };
    contents
        .trim()
        .parse()
        .with_context(|| format!("highscore file {} holds no number", path.display()))
}

/// Writes `highscore`, creating the parent directory if needed.
pub(crate) fn store(path: &Path, highscore: u32) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, format!("{highscore}\n"))
        .with_context(|| format!("failed to write highscore at {}", path.display()))
}

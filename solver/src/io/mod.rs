//! Side-effecting storage and filesystem access for the solver.

pub mod brainstorming_store;
pub mod compiler;
pub mod config;
pub mod documents;
pub mod files;
pub mod init;
pub mod instructions;
pub mod problem_store;

use std::fs;
use std::io;
use std::path::Path;

/// Write `contents` next to `path` under a `.tmp` name, then rename over it.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path missing parent {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

use std::fs;
use std::path::{Path, PathBuf};

use crate::bws::*;

pub const STDOUT: &str = "stdout";

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path of the configuration file against the directory of that file.
/// Absolute paths and the special value `stdout` are left untouched.
pub fn resolve_path(root: &Path, path: &str) -> String {
    if path == STDOUT || Path::new(path).is_absolute() {
        return path.to_string();
    }
    let p: PathBuf = root.join(path);
    p.display().to_string()
}

/// Writes the content to the given file, or to the standard output for `stdout`.
/// An empty path writes nothing.
pub fn write_output(path: &str, content: &str) -> BwsResult<()> {
    match path {
        "" => {
            debug!("write_output: empty path, skipping");
        }
        STDOUT => {
            println!("{}", content);
        }
        p => {
            fs::write(p, content).context(WritingFileSnafu { path: p })?;
            info!("write_output: wrote {} bytes to {}", content.len(), p);
        }
    }
    Ok(())
}

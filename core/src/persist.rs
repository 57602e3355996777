use crate::error::Result;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::Path;

/// Writes a snapshot in one piece, creating missing parent directories.
/// The write is not atomic; callers wanting crash safety should write to a
/// temporary path and rename.
pub fn save_snapshot(path: &Path, json: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut f = File::create(path)?;
    f.write_all(json.as_bytes())?;
    f.flush()?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<String> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(buf)
}

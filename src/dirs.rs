use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Ensures that a directory exists at the specified path, creating it and any missing
/// parents if necessary.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensures the parent directory of a file path exists.
pub fn ensure_parent_exists(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => ensure_dir_exists(dir),
        _ => Ok(()),
    }
}

pub fn home_dir() -> Result<PathBuf> {
    let dir = std::env::var_os("HOME") // Unix/Linux/macOS
        .or_else(|| std::env::var_os("USERPROFILE")) // Windows
        .map(PathBuf::from);
    match dir {
        Some(dir) => Ok(dir),
        None => {
            bail!("could not determine home directory, please specify config path manually")
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from("/etc/chatwatch"));
    }

    let home = home_dir()?;
    Ok(home.join(".config").join("chatwatch"))
}

pub fn data_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from("/var/lib/chatwatch"));
    }

    let home = home_dir()?;

    if cfg!(unix) {
        return Ok(home.join(".local").join("share").join("chatwatch"));
    }

    if cfg!(windows) {
        return Ok(home.join("AppData").join("chatwatch"));
    }

    bail!("could not determine data directory, please specify data path manually")
}

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_exists() {
        let base = tempfile::tempdir().unwrap();

        let nested = base.path().join("tokens/cache/deep");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        // Existing directory is not an error
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_parent_exists() {
        let base = tempfile::tempdir().unwrap();

        let file = base.path().join("a/b/tokens.json");
        ensure_parent_exists(&file).unwrap();
        assert!(base.path().join("a/b").is_dir());
        assert!(!file.exists());

        // Bare file names have no parent to create
        ensure_parent_exists(Path::new("tokens.json")).unwrap();
    }
}

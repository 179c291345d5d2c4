//! Filesystem helpers shared by the detector and the steps

use std::fs;
use std::io;
use std::path::Path;

/// True when `path` is a directory holding at least one entry
pub fn dir_has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// True when the file can be read and contains `needle` verbatim
pub fn file_contains(path: &Path, needle: &str) -> bool {
    fs::read_to_string(path)
        .map(|content| content.contains(needle))
        .unwrap_or(false)
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Copy `src` into `dst` recursively, creating directories and overwriting
/// files. Returns the number of files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory {} does not exist", src.display()),
        ));
    }
    fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// True when `src` is non-empty and each of its top-level entries also
/// exists in `dst`
pub fn entries_present_in(src: &Path, dst: &Path) -> bool {
    let Ok(entries) = fs::read_dir(src) else {
        return false;
    };
    let mut seen = 0;
    for entry in entries {
        let Ok(entry) = entry else {
            return false;
        };
        if !dst.join(entry.file_name()).exists() {
            return false;
        }
        seen += 1;
    }
    seen > 0
}

/// Mark an extracted binary executable (0755)
pub fn make_executable(path: &Path) -> io::Result<()> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file", path.display()),
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

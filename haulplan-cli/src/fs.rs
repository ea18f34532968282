//! Capability-based path checks for command inputs.

use std::io;
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

use crate::CliError;

/// Open the directory containing `path`, returning it with the file name.
fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path should name a file"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Fail unless `path` is an existing regular file.
pub(crate) fn require_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    let inspected =
        open_dir_and_file(path).and_then(|(dir, name)| dir.metadata(name.as_str()));
    match inspected {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Create the parent directories of `path` when they are missing.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (base, relative) = match parent.as_std_path().components().next() {
        Some(Component::RootDir) => {
            let root = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = parent
                .strip_prefix(&root)
                .map_err(|_| io::Error::other("failed to strip root from parent path"))?
                .to_path_buf();
            (root, relative)
        }
        _ => (Utf8PathBuf::from("."), parent.to_path_buf()),
    };
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?.create_dir_all(&relative)
}

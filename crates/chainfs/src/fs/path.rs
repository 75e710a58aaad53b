//! Helpers for the flat, full-path namespace.

use crate::error::{FsError, FsResult};
use crate::layout::ROOT_PATH;

/// `validate` accepts `/` and absolute paths without empty, `.` or `..` segments
/// or a trailing slash.
///
/// # Errors
/// Returns `InvalidArgument` for anything else.
pub fn validate(path: &str) -> FsResult<()> {
    if path == ROOT_PATH {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(FsError::InvalidArgument);
    };
    if rest.split('/').any(|seg| matches!(seg, "" | "." | "..")) {
        return Err(FsError::InvalidArgument);
    }
    Ok(())
}

/// `parent_of` returns the directory holding `path`. The root is its own parent.
#[must_use]
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT_PATH,
        Some(idx) => &path[..idx],
    }
}

/// `file_name` returns the last segment of `path`, empty for the root.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// `is_child` reports whether `candidate` sits exactly one segment below `dir`.
#[must_use]
pub fn is_child(dir: &str, candidate: &str) -> bool {
    if candidate == ROOT_PATH || candidate == dir {
        return false;
    }
    parent_of(candidate) == dir
}

/// `join` appends one segment to a directory path.
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT_PATH {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

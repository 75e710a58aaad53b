use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    AlreadyExists,
    BlockOutOfRange(usize),
    Busy,
    Corrupt,
    FileTooLarge,
    InvalidArgument,
    Io,
    IsDir,
    NoSpace,
    NotDir,
    NotEmpty,
    NotFound,
    TooManyLinks,
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    /// `errno` maps the error onto the code reported to the kernel.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::AlreadyExists => libc::EEXIST,
            Self::BlockOutOfRange(_) | Self::Corrupt | Self::Io => libc::EIO,
            Self::Busy => libc::EBUSY,
            Self::FileTooLarge => libc::EFBIG,
            Self::InvalidArgument => libc::EINVAL,
            Self::IsDir => libc::EISDIR,
            Self::NoSpace => libc::ENOSPC,
            Self::NotDir => libc::ENOTDIR,
            Self::NotEmpty => libc::ENOTEMPTY,
            Self::NotFound => libc::ENOENT,
            Self::TooManyLinks => libc::EMLINK,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => f.write_str("file exists"),
            Self::BlockOutOfRange(index) => write!(f, "block index {index} out of range"),
            Self::Busy => f.write_str("resource busy"),
            Self::Corrupt => f.write_str("filesystem structure is corrupt"),
            Self::FileTooLarge => f.write_str("file too large"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::Io => f.write_str("device i/o error"),
            Self::IsDir => f.write_str("is a directory"),
            Self::NoSpace => f.write_str("no free blocks remaining"),
            Self::NotDir => f.write_str("not a directory"),
            Self::NotEmpty => f.write_str("directory not empty"),
            Self::NotFound => f.write_str("no such file or directory"),
            Self::TooManyLinks => f.write_str("too many links"),
        }
    }
}

impl std::error::Error for FsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_matches_conventional_codes() {
        assert_eq!(FsError::NotFound.errno(), libc::ENOENT);
        assert_eq!(FsError::NotEmpty.errno(), libc::ENOTEMPTY);
        assert_eq!(FsError::NoSpace.errno(), libc::ENOSPC);
        assert_eq!(FsError::InvalidArgument.errno(), libc::EINVAL);
        assert_eq!(FsError::Corrupt.errno(), libc::EIO);
        assert_eq!(FsError::BlockOutOfRange(99).errno(), libc::EIO);
    }

    #[test]
    fn display_names_the_block() {
        let msg = FsError::BlockOutOfRange(17).to_string();
        assert!(msg.contains("17"));
    }
}

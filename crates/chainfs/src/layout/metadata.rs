use crate::codec::{decode_int, decode_name, encode_name, write_int};
use crate::error::{FsError, FsResult};

use super::{
    FILE_DATA_LOC, FILE_DATA_SIZE, Geometry, Link, NAME_LOC, NAME_SIZE, NEXT_BLOCK_LOC,
    NEXT_FILE_LOC, StatField,
};

pub const S_IFMT: u32 = 0o170_000;
pub const S_IFDIR: u32 = 0o040_000;
pub const S_IFREG: u32 = 0o100_000;

const MODE_MASK: u32 = 0o177_777;

/// Owner ids recorded in new metadata blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    /// `current` returns the ids of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self {
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub st_mode: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_nlink: u32,
    pub st_size: u64,
    pub st_ctime: u64,
    pub st_mtime: u64,
    pub st_atime: u64,
}

impl Attributes {
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.st_mode & S_IFMT == S_IFDIR
    }

    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.st_mode & 0o7777
    }
}

/// `format_metadata` builds the stat fields and name of a new file or directory.
///
/// uid and gid keep their low 16 bits, times are clamped to the field width.
///
/// # Errors
/// Returns `InvalidArgument` if the path does not fit the name field.
pub fn format_metadata(
    path: &str,
    mode: u32,
    nlink: u32,
    owner: Owner,
    now: u64,
) -> FsResult<Vec<u8>> {
    let name = encode_name(path, NAME_SIZE)?;
    let mut payload = vec![0u8; FILE_DATA_SIZE];
    let now = now.min(StatField::Ctime.max());
    let values = [
        (StatField::Mode, u64::from(mode & MODE_MASK)),
        (StatField::Uid, u64::from(owner.uid) & StatField::Uid.max()),
        (StatField::Gid, u64::from(owner.gid) & StatField::Gid.max()),
        (StatField::Nlink, u64::from(nlink)),
        (StatField::Size, 0),
        (StatField::Ctime, now),
        (StatField::Mtime, now),
        (StatField::Atime, now),
    ];
    for (field, value) in values {
        let start = field.loc() - FILE_DATA_LOC;
        write_int(&mut payload[start..start + field.width()], value)?;
    }
    let name_start = NAME_LOC - FILE_DATA_LOC;
    payload[name_start..name_start + NAME_SIZE].copy_from_slice(&name);
    Ok(payload)
}

fn with_header(
    geometry: &Geometry,
    next_file: Link,
    next_block: Link,
    payload: &[u8],
) -> FsResult<Vec<u8>> {
    let mut block = vec![0u8; geometry.block_size()];
    geometry.write_link(&mut block, NEXT_FILE_LOC, next_file)?;
    geometry.write_link(&mut block, NEXT_BLOCK_LOC, next_block)?;
    let end = FILE_DATA_LOC + payload.len();
    if end > block.len() {
        return Err(FsError::InvalidArgument);
    }
    block[FILE_DATA_LOC..end].copy_from_slice(payload);
    Ok(block)
}

/// `directory_block` lays out a whole directory block with a zeroed handle counter.
/// For the root, `next_free_hint` is the free-list head; new directories pass `None`.
///
/// # Errors
/// Returns `InvalidArgument` if the path does not fit the name field.
pub fn directory_block(
    geometry: &Geometry,
    path: &str,
    mode: u32,
    next_free_hint: Link,
    owner: Owner,
    now: u64,
) -> FsResult<Vec<u8>> {
    let metadata = format_metadata(path, S_IFDIR | (mode & 0o7777), 2, owner, now)?;
    with_header(geometry, None, next_free_hint, &metadata)
}

/// `file_block` lays out a metadata block that owns no data blocks yet.
///
/// # Errors
/// Returns `InvalidArgument` if the path does not fit the name field.
pub fn file_block(
    geometry: &Geometry,
    path: &str,
    mode: u32,
    nlink: u32,
    owner: Owner,
    now: u64,
) -> FsResult<Vec<u8>> {
    let metadata = format_metadata(path, mode, nlink, owner, now)?;
    with_header(geometry, None, None, &metadata)
}

/// `free_block` lays out a blank block pointing at `next_free`.
///
/// # Errors
/// Returns `Corrupt` only if the geometry cannot hold a header.
pub fn free_block(geometry: &Geometry, next_free: Link) -> FsResult<Vec<u8>> {
    with_header(geometry, None, next_free, &[])
}

/// `data_block` lays out one link of a content chain, zero padding `content`.
///
/// # Errors
/// Returns `InvalidArgument` if `content` exceeds the effective block size.
pub fn data_block(geometry: &Geometry, next: Link, content: &[u8]) -> FsResult<Vec<u8>> {
    with_header(geometry, None, next, content)
}

/// `parse_attributes` decodes the eight stat fields of a metadata block.
///
/// # Errors
/// Returns `Corrupt` if the block is too short to be a metadata block.
pub fn parse_attributes(block: &[u8]) -> FsResult<Attributes> {
    if block.len() < NAME_LOC {
        return Err(FsError::Corrupt);
    }
    let field = |f: StatField| decode_int(&block[f.loc()..f.loc() + f.width()]);
    Ok(Attributes {
        st_mode: field(StatField::Mode) as u32,
        st_uid: field(StatField::Uid) as u32,
        st_gid: field(StatField::Gid) as u32,
        st_nlink: field(StatField::Nlink) as u32,
        st_size: field(StatField::Size),
        st_ctime: field(StatField::Ctime),
        st_mtime: field(StatField::Mtime),
        st_atime: field(StatField::Atime),
    })
}

/// # Errors
/// Returns `Corrupt` if the block is too short to hold the field.
pub fn read_field(block: &[u8], field: StatField) -> FsResult<u64> {
    block
        .get(field.loc()..field.loc() + field.width())
        .map(decode_int)
        .ok_or(FsError::Corrupt)
}

/// # Errors
/// Returns `Corrupt` for short blocks, `InvalidArgument` if `value` overflows the field.
pub fn write_field(block: &mut [u8], field: StatField, value: u64) -> FsResult<()> {
    let dst = block
        .get_mut(field.loc()..field.loc() + field.width())
        .ok_or(FsError::Corrupt)?;
    write_int(dst, value)
}

/// `block_name` decodes the path stored in a metadata block.
#[must_use]
pub fn block_name(block: &[u8]) -> String {
    block
        .get(NAME_LOC..NAME_LOC + NAME_SIZE)
        .map(decode_name)
        .unwrap_or_default()
}

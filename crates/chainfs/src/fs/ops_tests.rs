use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use super::test_utils::{TEST_OWNER, mem_fs};
use super::{ChainFs, Operations};
use crate::device::ImageDevice;
use crate::error::FsError;
use crate::layout::{Geometry, NAME_SIZE};

#[test]
fn ten_block_scenario() {
    let mut fs = mem_fs(10);
    fs.create("/a", 0o644).expect("a");
    fs.create("/b", 0o644).expect("b");
    assert_eq!(fs.readdir("/").expect("readdir"), vec![".", "..", "a", "b"]);

    let data = b"12345";
    assert_eq!(fs.write("/a", data, 0).expect("write"), 5);
    assert_eq!(fs.getattr("/a").expect("attr").st_size, 5);

    fs.truncate("/a", 2).expect("truncate");
    assert_eq!(fs.read("/a", 10, 0).expect("read"), &data[..2]);

    fs.mkdir("/d", 0o755).expect("mkdir");
    assert_eq!(fs.getattr("/d").expect("attr").st_nlink, 2);
    fs.rmdir("/d").expect("rmdir while empty");

    fs.mkdir("/d", 0o755).expect("mkdir again");
    fs.create("/d/x", 0o644).expect("child");
    assert_eq!(fs.rmdir("/d"), Err(FsError::NotEmpty));
    fs.verify().expect("consistent");
}

#[test]
fn create_then_unlink_returns_blocks() {
    let mut fs = mem_fs(10);
    fs.create("/a", 0o644).expect("create");
    fs.write("/a", &[3u8; 80], 0).expect("write");
    assert!(fs.readdir("/").expect("readdir").contains(&"a".to_string()));

    let meta = fs.lookup("/a").expect("a").cur;
    let mut owned = fs.data_chain(meta).expect("chain");
    owned.push(meta);

    fs.unlink("/a").expect("unlink");
    assert_eq!(fs.lookup("/a"), Err(FsError::NotFound));
    assert_eq!(fs.getattr("/a"), Err(FsError::NotFound));
    let free = fs.free_blocks().expect("free");
    for block in owned {
        assert!(free.contains(&block), "block {block} back on the free list");
    }
    assert_eq!(free.len(), 9);
}

#[test]
fn new_entries_carry_mode_and_owner() {
    let mut fs = mem_fs(10);
    fs.create("/f", 0o640).expect("create");
    fs.mkdir("/d", 0o750).expect("mkdir");

    let f = fs.getattr("/f").expect("f");
    assert!(!f.is_dir());
    assert_eq!(f.permissions(), 0o640);
    assert_eq!(f.st_uid, TEST_OWNER.uid);

    let d = fs.getattr("/d").expect("d");
    assert!(d.is_dir());
    assert_eq!(d.permissions(), 0o750);
}

#[test]
fn removal_errors() {
    let mut fs = mem_fs(10);
    fs.create("/f", 0o644).expect("f");
    fs.mkdir("/d", 0o755).expect("d");

    assert_eq!(fs.unlink("/d"), Err(FsError::IsDir));
    assert_eq!(fs.unlink("/"), Err(FsError::IsDir));
    assert_eq!(fs.unlink("/ghost"), Err(FsError::NotFound));
    assert_eq!(fs.rmdir("/f"), Err(FsError::NotDir));
    assert_eq!(fs.rmdir("/"), Err(FsError::Busy));
    assert_eq!(fs.rmdir("/ghost"), Err(FsError::NotFound));
    assert_eq!(fs.mkdir("/", 0o755), Err(FsError::AlreadyExists));
    assert_eq!(fs.mkdir("/d", 0o755), Err(FsError::AlreadyExists));
}

#[test]
fn rmdir_lowers_parent_link_count() {
    let mut fs = mem_fs(10);
    fs.mkdir("/d", 0o755).expect("d");
    fs.mkdir("/d/e", 0o755).expect("e");
    fs.rmdir("/d/e").expect("rmdir e");
    assert_eq!(fs.getattr("/d").expect("d").st_nlink, 2);
    fs.rmdir("/d").expect("rmdir d");
    assert_eq!(fs.getattr("/").expect("root").st_nlink, 2);
    assert_eq!(fs.readdir("/").expect("readdir"), vec![".", ".."]);
}

#[test]
fn malformed_paths_are_invalid() {
    let mut fs = mem_fs(10);
    assert_eq!(fs.create("relative", 0o644), Err(FsError::InvalidArgument));
    assert_eq!(fs.create("/trailing/", 0o644), Err(FsError::InvalidArgument));
    let long = format!("/{}", "x".repeat(NAME_SIZE));
    assert_eq!(fs.create(&long, 0o644), Err(FsError::InvalidArgument));
    assert_eq!(fs.getattr("//"), Err(FsError::InvalidArgument));
}

#[test]
fn dot_segments_are_invalid() {
    let mut fs = mem_fs(10);
    fs.mkdir("/d", 0o755).expect("mkdir");
    let free_before = fs.free_blocks().expect("free").len();

    assert_eq!(fs.create("/d/.", 0o644), Err(FsError::InvalidArgument));
    assert_eq!(fs.create("/d/..", 0o644), Err(FsError::InvalidArgument));
    assert_eq!(fs.mkdir("/..", 0o755), Err(FsError::InvalidArgument));
    assert_eq!(fs.getattr("/d/.."), Err(FsError::InvalidArgument));

    assert_eq!(fs.readdir("/d").expect("readdir"), vec![".", ".."]);
    assert_eq!(fs.free_blocks().expect("free").len(), free_before);
    fs.verify().expect("consistent");
}

#[test]
fn readdir_of_file_is_not_dir() {
    let mut fs = mem_fs(10);
    fs.create("/f", 0o644).expect("f");
    assert_eq!(fs.readdir("/f"), Err(FsError::NotDir));
}

#[test]
fn utimens_sets_or_stamps_times() {
    let mut fs = mem_fs(10);
    fs.create("/f", 0o644).expect("f");
    fs.utimens("/f", Some((1_000, 2_000))).expect("explicit");
    let attr = fs.getattr("/f").expect("attr");
    assert_eq!((attr.st_atime, attr.st_mtime), (1_000, 2_000));

    fs.utimens("/f", None).expect("now");
    let attr = fs.getattr("/f").expect("attr");
    assert!(attr.st_atime > 2_000);
    assert_eq!(attr.st_atime, attr.st_mtime);

    fs.utimens("/f", Some((u64::MAX, 0))).expect("clamped");
    assert_eq!(fs.getattr("/f").expect("attr").st_atime, u64::from(u32::MAX));
}

#[test]
fn xattrs_are_always_empty() {
    let mut fs = mem_fs(10);
    fs.create("/f", 0o644).expect("f");
    assert!(fs.getxattr("/f", "user.any").expect("getxattr").is_empty());
    assert!(fs.listxattr("/").expect("listxattr").is_empty());
    assert_eq!(fs.listxattr("/ghost"), Err(FsError::NotFound));
}

#[test]
fn statfs_counts_blocks_and_files() {
    let mut fs = mem_fs(10);
    fs.create("/f", 0o644).expect("f");
    fs.write("/f", b"abc", 0).expect("write");
    let stats = fs.statfs().expect("statfs");
    assert_eq!(stats.total_blocks, 10);
    assert_eq!(stats.free_blocks, 7);
    assert_eq!(stats.files, 2);
    assert_eq!(stats.block_size, 64);
    assert_eq!(stats.name_max, NAME_SIZE);
}

#[test]
fn random_operations_conserve_blocks() {
    const PATHS: [&str; 6] = ["/a", "/b", "/c", "/d", "/d/x", "/d/y"];
    let mut fs = mem_fs(24);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for step in 0..400 {
        let path = PATHS[rng.random_range(0..PATHS.len())];
        let result = match rng.random_range(0..6) {
            0 => fs.create(path, 0o644).map(drop),
            1 => fs.mkdir(path, 0o755),
            2 => {
                let len = rng.random_range(0..200);
                let offset = rng.random_range(0..150);
                fs.write(path, &vec![step as u8; len], offset).map(drop)
            }
            3 => fs.truncate(path, rng.random_range(0..300)),
            4 => fs.unlink(path),
            _ => fs.rmdir(path),
        };
        assert_ne!(result, Err(FsError::Corrupt), "step {step} on {path}");

        let usage = fs.verify().expect("every block on exactly one list");
        assert_eq!(usage.total(), 24);
    }
}

#[test]
fn image_survives_remount() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("disk.img");
    let geometry = Geometry::new(64, 16).expect("geometry");

    {
        let dev = ImageDevice::open(&path, geometry).expect("open");
        assert!(dev.is_fresh());
        let mut fs = ChainFs::format(dev).expect("format");
        fs.mkdir("/docs", 0o755).expect("mkdir");
        fs.create("/docs/a", 0o644).expect("create");
        fs.write("/docs/a", b"persisted across mounts", 0).expect("write");
        fs.sync().expect("sync");
    }

    let dev = ImageDevice::open(&path, geometry).expect("reopen");
    assert!(!dev.is_fresh());
    let fs = ChainFs::open(dev).expect("open fs");
    assert_eq!(
        fs.read("/docs/a", 100, 0).expect("read"),
        b"persisted across mounts"
    );
    assert_eq!(fs.readdir("/docs").expect("readdir"), vec![".", "..", "a"]);
    assert_eq!(fs.superblock().handle, 2);
    fs.verify().expect("consistent");
}

#[test]
fn open_rejects_unformatted_device() {
    let dev = crate::device::MemDevice::new(Geometry::new(64, 4).expect("geometry"));
    assert!(matches!(ChainFs::open(dev), Err(FsError::Corrupt)));
}

use super::*;

const OWNER: Owner = Owner {
    uid: 1000,
    gid: 100,
};

#[test]
fn field_table_matches_format() {
    let mut end = FILE_DATA_LOC;
    for field in StatField::ALL {
        assert_eq!(field.loc(), end, "{field:?} must follow the previous field");
        end += field.width();
    }
    assert_eq!(end, NAME_LOC);
    assert_eq!(NAME_LOC + NAME_SIZE, FH_LOC);
    assert_eq!(FH_LOC, 39);
    assert_eq!(MIN_BLOCK_SIZE, 40);
}

#[test]
fn geometry_validates_limits() {
    assert!(Geometry::new(MIN_BLOCK_SIZE, 2).is_ok());
    assert!(Geometry::new(64, MAX_NUM_BLOCKS).is_ok());
    assert_eq!(Geometry::new(MIN_BLOCK_SIZE - 1, 16), Err(FsError::InvalidArgument));
    assert_eq!(Geometry::new(64, 1), Err(FsError::InvalidArgument));
    assert_eq!(Geometry::new(64, MAX_NUM_BLOCKS + 1), Err(FsError::InvalidArgument));
}

#[test]
fn sentinel_decodes_to_none() {
    let geometry = Geometry::new(64, 10).unwrap();
    assert_eq!(geometry.sentinel(), 10);
    assert_eq!(geometry.decode_link(10), Ok(None));
    assert_eq!(geometry.decode_link(3), Ok(Some(BlockIndex::new(3))));
    assert_eq!(geometry.decode_link(11), Err(FsError::Corrupt));
    assert_eq!(geometry.encode_link(None), 10);
}

#[test]
fn blocks_for_keeps_one_block_for_empty_content() {
    let geometry = Geometry::new(64, 10).unwrap();
    let ebs = geometry.effective_block_size();
    assert_eq!(ebs, 62);
    assert_eq!(geometry.blocks_for(0), 1);
    assert_eq!(geometry.blocks_for(1), 1);
    assert_eq!(geometry.blocks_for(ebs), 1);
    assert_eq!(geometry.blocks_for(ebs + 1), 2);
}

#[test]
fn metadata_payload_parses_back() {
    let geometry = Geometry::default();
    let block = file_block(&geometry, "/notes", S_IFREG | 0o644, 1, OWNER, 1_700_000_000).unwrap();
    assert_eq!(block.len(), geometry.block_size());
    assert_eq!(geometry.read_link(&block, NEXT_FILE_LOC), Ok(None));
    assert_eq!(geometry.read_link(&block, NEXT_BLOCK_LOC), Ok(None));

    let attr = parse_attributes(&block).unwrap();
    assert_eq!(attr.st_mode, S_IFREG | 0o644);
    assert_eq!(attr.st_uid, 1000);
    assert_eq!(attr.st_gid, 100);
    assert_eq!(attr.st_nlink, 1);
    assert_eq!(attr.st_size, 0);
    assert_eq!(attr.st_ctime, 1_700_000_000);
    assert_eq!(attr.st_mtime, attr.st_ctime);
    assert_eq!(attr.st_atime, attr.st_ctime);
    assert!(!attr.is_dir());
    assert_eq!(block_name(&block), "/notes");
}

#[test]
fn directory_block_carries_free_hint_and_zero_handle() {
    let geometry = Geometry::default();
    let block = directory_block(&geometry, "/", 0o755, Some(BlockIndex::new(1)), OWNER, 0).unwrap();
    assert_eq!(geometry.read_link(&block, NEXT_BLOCK_LOC), Ok(Some(BlockIndex::new(1))));
    assert_eq!(block[FH_LOC], 0);

    let attr = parse_attributes(&block).unwrap();
    assert!(attr.is_dir());
    assert_eq!(attr.permissions(), 0o755);
    assert_eq!(attr.st_nlink, 2);
}

#[test]
fn wide_owner_ids_keep_low_bits() {
    let owner = Owner {
        uid: 0x0001_0005,
        gid: 0x0002_0007,
    };
    let payload = format_metadata("/x", S_IFREG, 1, owner, u64::MAX).unwrap();
    let mut block = vec![0u8; FILE_DATA_LOC];
    block.extend_from_slice(&payload);
    let attr = parse_attributes(&block).unwrap();
    assert_eq!(attr.st_uid, 5);
    assert_eq!(attr.st_gid, 7);
    assert_eq!(attr.st_mtime, StatField::Mtime.max());
}

#[test]
fn free_block_is_blank_past_header() {
    let geometry = Geometry::new(64, 10).unwrap();
    let block = free_block(&geometry, Some(BlockIndex::new(4))).unwrap();
    assert_eq!(block[NEXT_FILE_LOC], 10);
    assert_eq!(block[NEXT_BLOCK_LOC], 4);
    assert!(block[HEADER_SIZE..].iter().all(|&b| b == 0));
}

#[test]
fn data_block_rejects_oversized_content() {
    let geometry = Geometry::new(64, 10).unwrap();
    let content = vec![1u8; geometry.effective_block_size() + 1];
    assert_eq!(data_block(&geometry, None, &content), Err(FsError::InvalidArgument));
}

#[test]
fn fields_update_in_place() {
    let geometry = Geometry::default();
    let mut block = file_block(&geometry, "/f", S_IFREG, 1, OWNER, 0).unwrap();
    write_field(&mut block, StatField::Size, 500).unwrap();
    assert_eq!(read_field(&block, StatField::Size), Ok(500));
    assert_eq!(
        write_field(&mut block, StatField::Nlink, 256),
        Err(FsError::InvalidArgument)
    );
    assert_eq!(block_name(&block), "/f");
}

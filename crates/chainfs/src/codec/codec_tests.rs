use super::*;
use crate::layout::{MAX_NUM_BLOCKS, NAME_SIZE};

#[test]
fn every_block_pointer_round_trips_in_one_byte() {
    for value in 0..=MAX_NUM_BLOCKS as u64 {
        let bytes = encode_int(value, 1).expect("fits in one byte");
        assert_eq!(bytes.len(), 1);
        assert_eq!(decode_int(&bytes), value);
    }
}

#[test]
fn wider_fields_are_big_endian() {
    assert_eq!(encode_int(0x0102, 2).unwrap(), vec![0x01, 0x02]);
    assert_eq!(encode_int(0xDEAD_BEEF, 4).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(decode_int(&[0x00, 0x00, 0x01, 0x00]), 256);
}

#[test]
fn rejects_values_that_do_not_fit() {
    assert_eq!(encode_int(256, 1), Err(FsError::InvalidArgument));
    assert_eq!(encode_int(1 << 16, 2), Err(FsError::InvalidArgument));
    assert_eq!(encode_int(1, 0), Err(FsError::InvalidArgument));
    assert_eq!(encode_int(1, 9), Err(FsError::InvalidArgument));
}

#[test]
fn write_int_leaves_neighbours_untouched() {
    let mut buf = [0xAAu8; 6];
    write_int(&mut buf[2..4], 0x1234).unwrap();
    assert_eq!(buf, [0xAA, 0xAA, 0x12, 0x34, 0xAA, 0xAA]);
}

#[test]
fn names_are_zero_padded() {
    let bytes = encode_name("/a", NAME_SIZE).unwrap();
    assert_eq!(bytes.len(), NAME_SIZE);
    assert_eq!(&bytes[..2], b"/a");
    assert!(bytes[2..].iter().all(|&b| b == 0));
    assert_eq!(decode_name(&bytes), "/a");
}

#[test]
fn empty_path_encodes_as_root() {
    let bytes = encode_name("", NAME_SIZE).unwrap();
    assert_eq!(decode_name(&bytes), "/");
}

#[test]
fn name_filling_the_field_decodes_without_terminator() {
    let path = format!("/{}", "x".repeat(NAME_SIZE - 1));
    let bytes = encode_name(&path, NAME_SIZE).unwrap();
    assert_eq!(decode_name(&bytes), path);
}

#[test]
fn paths_up_to_limit_round_trip() {
    for len in 1..NAME_SIZE {
        let path = format!("/{}", "n".repeat(len - 1));
        let bytes = encode_name(&path, NAME_SIZE).unwrap();
        assert_eq!(decode_name(&bytes), path);
    }
}

#[test]
fn rejects_overlong_and_non_ascii_names() {
    let long = format!("/{}", "x".repeat(NAME_SIZE));
    assert_eq!(encode_name(&long, NAME_SIZE), Err(FsError::InvalidArgument));
    assert_eq!(encode_name("/caf\u{e9}", NAME_SIZE), Err(FsError::InvalidArgument));
    assert_eq!(encode_name("/a\0b", NAME_SIZE), Err(FsError::InvalidArgument));
}

/***************************************************************************************************
 * Integration tests driving the public `load`/`item` API end to end, covering the RFC 8949
 * concrete scenarios the crate is built against.
 **************************************************************************************************/
use libcbor_rs::alloc_policy::CountingAllocator;
use libcbor_rs::item::{self, IntWidth};
use libcbor_rs::load::{load, load_with_policy, LoadErrorCode};
use std::convert::TryFrom;

#[test]
fn uint8_zero() {
    let item = load(&[0x00]).unwrap();
    assert_eq!(item::width(&item), Some(IntWidth::W8));
    assert_eq!(u64::try_from(&*item).unwrap(), 0);
}

#[test]
fn uint32_one_million() {
    let item = load(&[0x1a, 0x00, 0x0f, 0x42, 0x40]).unwrap();
    assert_eq!(item::width(&item), Some(IntWidth::W32));
    assert_eq!(u64::try_from(&*item).unwrap(), 1_000_000);
}

#[test]
fn negint8_logical_minus_one() {
    let item = load(&[0x20]).unwrap();
    assert_eq!(item::width(&item), Some(IntWidth::W8));
    assert_eq!(i64::try_from(&*item).unwrap(), -1);
}

#[test]
fn definite_array_of_three() {
    let item = load(&[0x83, 0x01, 0x02, 0x03]).unwrap();
    assert!(item::is_definite(&item));
    assert_eq!(item::size(&item), Some(3));
    for (i, expected) in [1u64, 2, 3].iter().enumerate() {
        let child = item::array_get(&item, i).unwrap();
        assert_eq!(u64::try_from(&*child).unwrap(), *expected);
    }
}

#[test]
fn indefinite_array_of_two() {
    let item = load(&[0x9f, 0x01, 0x02, 0xff]).unwrap();
    assert!(!item::is_definite(&item));
    assert_eq!(item::size(&item), Some(2));
}

#[test]
fn indefinite_map_single_text_key() {
    let item = load(&[0xbf, 0x61, 0x61, 0x01, 0xff]).unwrap();
    assert!(!item::is_definite(&item));
    assert_eq!(item::size(&item), Some(1));
    let (k, v) = item::map_get_pair(&item, 0).unwrap();
    assert_eq!(item::as_str(&k).as_deref(), Some("a"));
    assert_eq!(u64::try_from(&*v).unwrap(), 1);
}

#[test]
fn indefinite_bytestring_collapses_via_copy_definite() {
    let item = load(&[0x5f, 0x42, 0x01, 0x02, 0x43, 0x03, 0x04, 0x05, 0xff]).unwrap();
    assert!(!item::is_definite(&item));
    assert_eq!(item::chunk_count(&item), Some(2));
    let collapsed = item::copy_definite(&item);
    assert!(item::is_definite(&collapsed));
    assert_eq!(&*item::bytes(&collapsed).unwrap(), &[1u8, 2, 3, 4, 5]);
}

#[test]
fn tag_zero_wraps_rfc3339_text() {
    let bytes: Vec<u8> = vec![
        0xc0, 0x74, 0x32, 0x30, 0x31, 0x33, 0x2d, 0x30, 0x33, 0x2d, 0x32, 0x31, 0x54, 0x32, 0x30,
        0x3a, 0x30, 0x34, 0x3a, 0x30, 0x30, 0x5a,
    ];
    let item = load(&bytes).unwrap();
    assert_eq!(item::tag_value(&item), Some(0));
    let child = item::tag_child(&item).unwrap();
    assert_eq!(item::as_str(&child).as_deref(), Some("2013-03-21T20:04:00Z"));
}

#[test]
fn lone_break_is_syntax_error_at_start() {
    let err = load(&[0xff]).unwrap_err();
    assert_eq!(err.code, LoadErrorCode::SyntaxError);
    assert_eq!(err.position, 0);
}

#[test]
fn truncated_array_is_not_enough_data_at_end() {
    let err = load(&[0x82, 0x01]).unwrap_err();
    assert_eq!(err.code, LoadErrorCode::NotEnoughData);
    assert_eq!(err.position, 2);
}

#[test]
fn empty_input_is_no_data() {
    let err = load(&[]).unwrap_err();
    assert_eq!(err.code, LoadErrorCode::NoData);
}

#[test]
fn every_reserved_ai_yields_malformed() {
    // major type 0 (uint) with each reserved AI.
    for ai in [0x1c, 0x1d, 0x1e] {
        let err = load(&[ai]).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::Malformed);
        assert_eq!(err.position, 0);
    }
}

#[test]
fn truncating_any_prefix_of_a_well_formed_item_yields_not_enough_data() {
    let full = [0x83u8, 0x01, 0x02, 0x03];
    for n in 0..full.len() {
        let err = load(&full[..n]).unwrap_err();
        assert!(matches!(
            err.code,
            LoadErrorCode::NoData | LoadErrorCode::NotEnoughData
        ));
    }
}

#[test]
fn copy_preserves_indefinite_structure() {
    let item = load(&[0x9f, 0x01, 0x02, 0xff]).unwrap();
    let copied = item::copy(&item);
    assert!(item::structurally_equal(&item, &copied));
    assert!(!item::is_definite(&copied));
}

#[test]
fn copy_definite_collapses_indefinite_array() {
    let item = load(&[0x9f, 0x01, 0x02, 0xff]).unwrap();
    let collapsed = item::copy_definite(&item);
    assert!(item::is_definite(&collapsed));
    assert_eq!(item::size(&collapsed), Some(2));
}

#[test]
fn refcount_tracks_clones() {
    let item = load(&[0x00]).unwrap();
    assert_eq!(item::refcount(&item), 1);
    let second = item::incref(&item);
    assert_eq!(item::refcount(&item), 2);
    let mut handle = Some(second);
    item::decref(&mut handle);
    assert!(handle.is_none());
    assert_eq!(item::refcount(&item), 1);
}

#[test]
fn allocator_failing_at_k_reports_mem_error_for_every_k() {
    let encoded = [0x83u8, 0x01, 0x02, 0x03];
    for k in 1..=4 {
        let mut policy = CountingAllocator::failing_at(k);
        let err = load_with_policy(&encoded, &mut policy).unwrap_err();
        assert_eq!(err.code, LoadErrorCode::MemError);
    }
}

#[cfg(feature = "float")]
#[test]
fn float_widths_decode() {
    let item = load(&[0xf9, 0x3c, 0x00]).unwrap();
    assert_eq!(item::float_value(&item), Some(1.0));

    let mut buf = vec![0xfau8];
    buf.extend_from_slice(&1.5f32.to_bits().to_be_bytes());
    let item = load(&buf).unwrap();
    assert_eq!(item::float_value(&item), Some(1.5));

    let mut buf = vec![0xfbu8];
    buf.extend_from_slice(&2.5f64.to_bits().to_be_bytes());
    let item = load(&buf).unwrap();
    assert_eq!(item::float_value(&item), Some(2.5));
}

#[test]
fn booleans_null_and_undefined() {
    let t = load(&[0xf5]).unwrap();
    assert_eq!(item::boolean(&t), Some(true));
    let f = load(&[0xf4]).unwrap();
    assert_eq!(item::boolean(&f), Some(false));
    let n = load(&[0xf6]).unwrap();
    assert!(item::is_null(&n));
    let u = load(&[0xf7]).unwrap();
    assert!(item::is_undefined(&u));
}

use std::ffi::c_void;
use std::os::raw::c_int;

use pktbridge_engine::{FfiAlloc, FfiBuffer, FfiHeader, FlatEngine, NativeStatus, PacketEngine};

/// Allocator backed by a Vec owned by the test
unsafe extern "C" fn vec_alloc(user_data: *mut c_void, size: usize, out: *mut FfiBuffer) -> c_int {
    let store = &mut *(user_data as *mut Vec<u8>);
    store.resize(size, 0);
    *out = FfiBuffer::from_mut_slice(store);
    0
}

fn build(engine: &FlatEngine, headers: &[(&str, &str)], payload: &[u8]) -> (Vec<u8>, FfiBuffer) {
    let ffi: Vec<FfiHeader> = headers
        .iter()
        .map(|(k, v)| FfiHeader::from_slices(k.as_bytes(), v.as_bytes()))
        .collect();
    build_raw(engine, &ffi, payload)
}

fn build_raw(engine: &FlatEngine, ffi: &[FfiHeader], payload: &[u8]) -> (Vec<u8>, FfiBuffer) {
    let mut store = Vec::new();
    let alloc = FfiAlloc {
        user_data: &mut store as *mut Vec<u8> as *mut c_void,
        alloc: Some(vec_alloc),
    };
    let mut out = FfiBuffer::empty();
    let status = unsafe { engine.build(ffi, FfiBuffer::from_slice(payload), alloc, &mut out) };
    assert_eq!(status, 0);
    (store, out)
}

#[test]
fn test_trait_round_trip() {
    let engine = FlatEngine::new();
    let (store, pkt) = build(&engine, &[("a", "1"), ("bb", "22")], b"xyz");
    assert_eq!(pkt.len, store.len());

    unsafe {
        let mut count = 0;
        assert_eq!(engine.header_count(pkt, &mut count), 0);
        assert_eq!(count, 2);

        let mut hdr = FfiHeader::default();
        assert_eq!(engine.header_at(pkt, 1, &mut hdr), 0);
        assert_eq!(hdr.key.as_slice(), b"bb");
        assert_eq!(hdr.val.as_slice(), b"22");

        let mut payload = FfiBuffer::empty();
        assert_eq!(engine.payload(pkt, &mut payload), 0);
        assert_eq!(payload.as_slice(), b"xyz");
    }
}

#[test]
fn test_trait_error_codes() {
    let engine = FlatEngine::new();
    let (_store, pkt) = build(&engine, &[("k", "v")], b"");

    unsafe {
        let mut hdr = FfiHeader::default();
        assert_eq!(
            engine.header_at(pkt, 1, &mut hdr),
            NativeStatus::OutOfRange.code()
        );

        let mut val = FfiBuffer::empty();
        assert_eq!(
            engine.find_header(pkt, FfiBuffer::from_slice(b"nope"), &mut val),
            NativeStatus::NotFound.code()
        );
        assert_eq!(engine.find_header(pkt, FfiBuffer::from_slice(b"k"), &mut val), 0);
        assert_eq!(val.as_slice(), b"v");
    }
}

#[test]
fn test_layout_is_little_endian_words() {
    let engine = FlatEngine::new();
    let (store, _pkt) = build(&engine, &[("k", "v")], b"p");

    let word = |i: usize| u64::from_le_bytes(store[i * 8..i * 8 + 8].try_into().unwrap());
    assert_eq!(word(0), 1); // count
    assert_eq!(word(1), 32); // key offset
    assert_eq!(word(2), 33); // val offset
    assert_eq!(word(3), 34); // payload offset
    assert_eq!(&store[32..], b"kvp");
}

#[test]
fn test_binary_spans_round_trip() {
    let engine = FlatEngine::new();
    let key = vec![0u8, 0xff, 0x80];
    let val: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
    let payload: Vec<u8> = (0..70_000).map(|i| (i % 256) as u8).collect();
    let ffi = [FfiHeader::from_slices(&key, &val), FfiHeader::from_slices(&[], &[0xfe])];
    let (_store, pkt) = build_raw(&engine, &ffi, &payload);

    unsafe {
        let mut hdr = FfiHeader::default();
        assert_eq!(engine.header_at(pkt, 0, &mut hdr), 0);
        assert_eq!(hdr.key.as_slice(), key.as_slice());
        assert_eq!(hdr.val.as_slice(), val.as_slice());

        assert_eq!(engine.header_at(pkt, 1, &mut hdr), 0);
        assert!(hdr.key.data.is_null() && hdr.key.len == 0);
        assert_eq!(hdr.val.as_slice(), &[0xfe]);

        assert_eq!(
            engine.header_at(pkt, 2, &mut hdr),
            NativeStatus::OutOfRange.code()
        );

        let mut body = FfiBuffer::empty();
        assert_eq!(engine.payload(pkt, &mut body), 0);
        assert_eq!(body.as_slice(), payload.as_slice());
    }
}

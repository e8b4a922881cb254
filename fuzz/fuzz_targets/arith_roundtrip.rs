#![no_main]
use arith_coder::{decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let blob = encode(data).unwrap();
    let output = decode(&blob).unwrap();
    assert_eq!(data, output.as_slice());
});

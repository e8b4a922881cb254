#![no_main]
use arith_coder::{ArithmeticDecoder, FrequencyTable, EOF_SYMBOL};
use libfuzzer_sys::fuzz_target;

// A skewed header decodes up to ~total symbols per bit of body.
const MAX_FUZZ_TOTAL: u32 = 1 << 12;
const MAX_FUZZ_SYMBOLS: usize = 1 << 16;

/// Decode at most `MAX_FUZZ_SYMBOLS` symbols; every step must fail cleanly
/// or make progress.
fn bounded_decode(blob: &[u8]) {
    let mut rest = blob;
    let table = match FrequencyTable::deserialize(&mut rest) {
        Ok(table) if table.total() <= MAX_FUZZ_TOTAL => table,
        _ => return,
    };
    let cum = table.cumulative();
    let mut decoder = match ArithmeticDecoder::new(&cum, rest) {
        Ok(decoder) => decoder,
        Err(_) => return,
    };
    for _ in 0..MAX_FUZZ_SYMBOLS {
        match decoder.decode_symbol() {
            Ok(EOF_SYMBOL) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

fuzz_target!(|data: (Vec<u8>, Vec<u8>)| {
    let (model_text, body) = data;

    // Arbitrary bytes as a whole blob.
    bounded_decode(&body);

    // A valid header over an arbitrary body.
    let mut blob = FrequencyTable::build(&model_text).to_bytes();
    blob.extend_from_slice(&body);
    bounded_decode(&blob);
});

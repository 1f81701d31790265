//! Pure data-model arithmetic exercised as public API (spec.md §3).

use medcodec_native::coding_parameters::{InterleaveMode, J2kRegion, JlsParams};

#[test]
fn jls_params_decode_size_accounts_for_sub_byte_depths() {
    let params = JlsParams { width: 512, height: 512, components: 1, bits_per_sample: 12, near_lossless: 0, interleave_mode: InterleaveMode::None };
    // 12 bits/sample rounds up to 2 bytes/sample.
    assert_eq!(params.required_decode_bytes(), 512 * 512 * 1 * 2);
}

#[test]
fn jls_params_decode_size_for_multi_component_8_bit() {
    let params = JlsParams { width: 64, height: 32, components: 3, bits_per_sample: 8, near_lossless: 0, interleave_mode: InterleaveMode::Sample };
    assert_eq!(params.required_decode_bytes(), 64 * 32 * 3);
}

#[test]
fn jls_encode_bound_is_raw_size_plus_one_sixteenth_plus_1024() {
    let params = JlsParams { width: 100, height: 100, components: 1, bits_per_sample: 8, near_lossless: 0, interleave_mode: InterleaveMode::None };
    let raw = params.required_decode_bytes();
    assert_eq!(params.encode_bound(), raw + raw / 16 + 1024);
}

#[test]
fn j2k_region_validity_rejects_empty_and_inverted_ranges() {
    assert!(J2kRegion { x0: 0, y0: 0, x1: 10, y1: 10 }.is_valid());
    assert!(!J2kRegion { x0: 10, y0: 0, x1: 10, y1: 10 }.is_valid());
    assert!(!J2kRegion { x0: 5, y0: 0, x1: 4, y1: 10 }.is_valid());
    assert!(!J2kRegion { x0: 0, y0: 0, x1: 0, y1: 0 }.is_valid());
}

//! JPEG-LS wrapper (spec.md §4.4), binding to the `charls` crate — the
//! CharLS reference-implementation binding `dicom-transfer-syntax-registry`
//! depends on under its own `charls` feature
//! ([`crate::adapters::jpegls`] mirrors its `JpegLSAdapter` shape).

use std::os::raw::c_int;
use std::slice;

use crate::coding_parameters::{InterleaveMode, JlsParams};
use crate::constants::{
    JLS_MAX_BITS_PER_SAMPLE, JLS_MAX_COMPONENTS, JLS_MAX_NEAR_LOSSLESS, JLS_MIN_BITS_PER_SAMPLE, JLS_MIN_COMPONENTS,
};
use crate::error::{fail, ErrorKind};

fn validate_params(params: &JlsParams) -> Result<(), String> {
    if !(JLS_MIN_BITS_PER_SAMPLE..=JLS_MAX_BITS_PER_SAMPLE).contains(&params.bits_per_sample) {
        return Err(format!("bits_per_sample {} out of range [{JLS_MIN_BITS_PER_SAMPLE},{JLS_MAX_BITS_PER_SAMPLE}]", params.bits_per_sample));
    }
    if !(JLS_MIN_COMPONENTS..=JLS_MAX_COMPONENTS).contains(&params.components) {
        return Err(format!("components {} out of range [{JLS_MIN_COMPONENTS},{JLS_MAX_COMPONENTS}]", params.components));
    }
    if params.near_lossless > JLS_MAX_NEAR_LOSSLESS {
        return Err(format!("near_lossless {} exceeds {JLS_MAX_NEAR_LOSSLESS}", params.near_lossless));
    }
    Ok(())
}

#[cfg(feature = "jls")]
fn probe_impl(input: &[u8]) -> Result<JlsParams, String> {
    let header = charls::CharLS::default()
        .read_header(input)
        .map_err(|e| e.to_string())?;
    Ok(JlsParams {
        width: header.width,
        height: header.height,
        components: header.component_count as u16,
        bits_per_sample: header.bits_per_sample as u8,
        near_lossless: header.near_lossless as u8,
        interleave_mode: match header.interleave_mode {
            charls::InterleaveMode::None => InterleaveMode::None,
            charls::InterleaveMode::Line => InterleaveMode::Line,
            charls::InterleaveMode::Sample => InterleaveMode::Sample,
        },
    })
}

#[cfg(not(feature = "jls"))]
fn probe_impl(_input: &[u8]) -> Result<JlsParams, String> {
    Err("jls support not compiled in (feature `jls` disabled)".to_string())
}

/// `jls_get_decode_size(in, in_len, *out_size, *params)` (spec.md §4.4).
///
/// # Safety
/// `input` must point to `input_len` readable bytes; the out-params must be
/// valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jls_get_decode_size(
    input: *const u8,
    input_len: usize,
    out_size: *mut usize,
    out_params: *mut JlsParams,
) -> c_int {
    if input.is_null() || input_len == 0 {
        return fail(ErrorKind::InvalidArgument, "jls_get_decode_size: null or empty input");
    }
    let bytes = unsafe { slice::from_raw_parts(input, input_len) };
    match probe_impl(bytes) {
        Ok(params) => {
            unsafe {
                *out_size = params.required_decode_bytes();
                *out_params = params;
            }
            0
        }
        Err(msg) => fail(ErrorKind::CorruptData, format_args!("jls_get_decode_size: {msg}")),
    }
}

#[cfg(feature = "jls")]
fn decode_impl(input: &[u8], output: &mut [u8]) -> Result<JlsParams, String> {
    let params = probe_impl(input)?;
    let required = params.required_decode_bytes();
    if output.len() < required {
        return Err(format!("output buffer too small: need {required}, have {}", output.len()));
    }
    let decoded = charls::CharLS::default().decode(input, 0).map_err(|e| e.to_string())?;
    output[..decoded.len()].copy_from_slice(&decoded);
    Ok(params)
}

#[cfg(not(feature = "jls"))]
fn decode_impl(_input: &[u8], _output: &mut [u8]) -> Result<JlsParams, String> {
    Err("jls support not compiled in (feature `jls` disabled)".to_string())
}

/// `jls_decode(in, in_len, out, out_len, *params)` (spec.md §4.4).
///
/// # Safety
/// `input`/`output` must point to their declared lengths; `out_params` must
/// be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jls_decode(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
    out_params: *mut JlsParams,
) -> c_int {
    if input.is_null() || output.is_null() {
        return fail(ErrorKind::InvalidArgument, "jls_decode: null buffer");
    }
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    match decode_impl(in_bytes, out_bytes) {
        Ok(params) => {
            unsafe { *out_params = params };
            0
        }
        Err(msg) if msg.starts_with("output buffer too small") => fail(ErrorKind::InvalidArgument, msg),
        Err(msg) => fail(ErrorKind::DecodeFailed, format_args!("jls_decode: {msg}")),
    }
}

/// `jls_get_encode_bound(*params, *max)` (spec.md §4.4): `raw_size +
/// raw_size/16 + 1024`.
///
/// # Safety
/// `params`/`out_max` must be valid for reads/writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jls_get_encode_bound(params: *const JlsParams, out_max: *mut usize) -> c_int {
    if params.is_null() || out_max.is_null() {
        return fail(ErrorKind::InvalidArgument, "jls_get_encode_bound: null argument");
    }
    let p = unsafe { *params };
    unsafe { *out_max = p.encode_bound() };
    0
}

#[cfg(feature = "jls")]
fn encode_impl(input: &[u8], params: &JlsParams) -> Result<Vec<u8>, String> {
    let mode = match params.interleave_mode {
        InterleaveMode::None => charls::InterleaveMode::None,
        InterleaveMode::Line => charls::InterleaveMode::Line,
        InterleaveMode::Sample => charls::InterleaveMode::Sample,
    };
    charls::CharLS::default()
        .encode_with(input, params.width, params.height, params.components as i32, params.bits_per_sample as i32, params.near_lossless as i32, mode)
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "jls"))]
fn encode_impl(_input: &[u8], _params: &JlsParams) -> Result<Vec<u8>, String> {
    Err("jls support not compiled in (feature `jls` disabled)".to_string())
}

/// `jls_encode(in, in_len, out, out_len, *actual, *params)` (spec.md §4.4).
/// Validates parameter ranges before calling the library and translates
/// library error codes into the unified taxonomy.
///
/// # Safety
/// `input`/`output` must point to their declared lengths; `actual_written`
/// and `params` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jls_encode(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
    actual_written: *mut usize,
    params: *const JlsParams,
) -> c_int {
    if input.is_null() || output.is_null() || params.is_null() || actual_written.is_null() {
        return fail(ErrorKind::InvalidArgument, "jls_encode: null argument");
    }
    let p = unsafe { *params };
    if let Err(msg) = validate_params(&p) {
        return fail(ErrorKind::InvalidArgument, format_args!("jls_encode: {msg}"));
    }
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    match encode_impl(in_bytes, &p) {
        Ok(encoded) => {
            if encoded.len() > out_bytes.len() {
                return fail(ErrorKind::InvalidArgument, "jls_encode: output buffer smaller than encoded stream");
            }
            out_bytes[..encoded.len()].copy_from_slice(&encoded);
            unsafe { *actual_written = encoded.len() };
            0
        }
        Err(msg) => fail(ErrorKind::EncodeFailed, format_args!("jls_encode: {msg}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> JlsParams {
        JlsParams { width: 64, height: 64, components: 1, bits_per_sample: 8, near_lossless: 0, interleave_mode: InterleaveMode::None }
    }

    #[test]
    fn validates_bits_per_sample_range() {
        let mut p = sample_params();
        p.bits_per_sample = 0;
        assert!(validate_params(&p).is_err());
        p.bits_per_sample = 17;
        assert!(validate_params(&p).is_err());
    }

    #[test]
    fn validates_components_range() {
        let mut p = sample_params();
        p.components = 0;
        assert!(validate_params(&p).is_err());
    }

    #[test]
    fn accepts_in_range_params() {
        assert!(validate_params(&sample_params()).is_ok());
    }

    #[test]
    fn encode_bound_formula() {
        let p = sample_params();
        let raw = p.required_decode_bytes();
        assert_eq!(p.encode_bound(), raw + raw / 16 + 1024);
    }
}

//! JPEG wrapper (spec.md §4.2): 8-bit baseline/extended JPEG decode and
//! encode, binding to the `jpeg-decoder`/`jpeg-encoder` crates rather than
//! re-deriving DCT/Huffman tables by hand.

use std::os::raw::c_int;
use std::slice;

use crate::coding_parameters::{JpegEncodeParams, Subsampling};
use crate::constants::FEATURE_JPEG;
use crate::error::{fail, ErrorKind};

/// Requested (or auto) output colorspace for [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ColorspaceArg {
    Auto = 0,
    Rgb = 1,
    Ybr = 2,
    Gray = 3,
}

struct HeaderInfo {
    width: u32,
    height: u32,
    components: u8,
    subsampling: Subsampling,
}

#[cfg(feature = "jpeg")]
fn read_header(input: &[u8]) -> Result<HeaderInfo, String> {
    let mut decoder = jpeg_decoder::Decoder::new(input);
    decoder.read_info().map_err(|e| e.to_string())?;
    let info = decoder.info().ok_or_else(|| "no frame header present".to_string())?;
    let components = info.component_count as u8;
    // jpeg-decoder exposes per-component sampling factors; approximate the
    // overall subsampling from the luma/chroma ratio when 3-component.
    let subsampling = if components >= 3 {
        let (h0, v0) = (info.components[0].horizontal_sampling_factor, info.components[0].vertical_sampling_factor);
        let (h1, v1) = (info.components[1].horizontal_sampling_factor, info.components[1].vertical_sampling_factor);
        if h0 == h1 && v0 == v1 {
            Subsampling::Ratio444
        } else if h0 == 2 * h1 && v0 == v1 {
            Subsampling::Ratio422
        } else {
            Subsampling::Ratio420
        }
    } else {
        Subsampling::Ratio444
    };
    Ok(HeaderInfo { width: info.width as u32, height: info.height as u32, components, subsampling })
}

#[cfg(not(feature = "jpeg"))]
fn read_header(_input: &[u8]) -> Result<HeaderInfo, String> {
    Err("jpeg support not compiled in (feature `jpeg` disabled)".to_string())
}

/// `jpeg_decode_header(in, in_len, *w, *h, *c, *sub)` (spec.md §4.2).
///
/// # Safety
/// `input` must point to `input_len` readable bytes; the four out-params
/// must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpeg_decode_header(
    input: *const u8,
    input_len: usize,
    out_width: *mut u32,
    out_height: *mut u32,
    out_components: *mut u32,
    out_subsampling: *mut i32,
) -> c_int {
    if input.is_null() || input_len == 0 {
        return fail(ErrorKind::InvalidArgument, "jpeg_decode_header: null or empty input");
    }
    let bytes = unsafe { slice::from_raw_parts(input, input_len) };
    match read_header(bytes) {
        Ok(info) => {
            unsafe {
                *out_width = info.width;
                *out_height = info.height;
                *out_components = info.components as u32;
                *out_subsampling = info.subsampling as i32;
            }
            0
        }
        Err(msg) => fail(ErrorKind::DecodeFailed, format_args!("jpeg_decode_header: {msg}")),
    }
}

#[cfg(feature = "jpeg")]
fn decode_impl(input: &[u8], output: &mut [u8], _requested: ColorspaceArg) -> Result<(u32, u32, u8), String> {
    let mut decoder = jpeg_decoder::Decoder::new(input);
    let pixels = decoder.decode().map_err(|e| e.to_string())?;
    let info = decoder.info().ok_or_else(|| "missing frame header after decode".to_string())?;
    let components = info.component_count as u8;
    let required = info.width as usize * info.height as usize * components as usize;
    if output.len() < required {
        return Err(format!("output buffer too small: need {required}, have {}", output.len()));
    }
    output[..pixels.len()].copy_from_slice(&pixels);
    Ok((info.width as u32, info.height as u32, components))
}

#[cfg(not(feature = "jpeg"))]
fn decode_impl(_input: &[u8], _output: &mut [u8], _requested: ColorspaceArg) -> Result<(u32, u32, u8), String> {
    Err("jpeg support not compiled in (feature `jpeg` disabled)".to_string())
}

/// `jpeg_decode(in, in_len, out, out_len, *w, *h, *c, cs)` (spec.md §4.2).
///
/// # Safety
/// `input`/`output` must point to their respective declared lengths of
/// readable/writable memory; the out-params must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpeg_decode(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
    out_width: *mut u32,
    out_height: *mut u32,
    out_components: *mut u32,
    requested_colorspace: i32,
) -> c_int {
    if input.is_null() || input_len == 0 || output.is_null() {
        return fail(ErrorKind::InvalidArgument, "jpeg_decode: null or empty buffer");
    }
    let cs = match requested_colorspace {
        0 => ColorspaceArg::Auto,
        1 => ColorspaceArg::Rgb,
        2 => ColorspaceArg::Ybr,
        3 => ColorspaceArg::Gray,
        _ => return fail(ErrorKind::InvalidArgument, "jpeg_decode: unknown colorspace request"),
    };
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    match decode_impl(in_bytes, out_bytes, cs) {
        Ok((w, h, c)) => {
            unsafe {
                *out_width = w;
                *out_height = h;
                *out_components = c as u32;
            }
            0
        }
        Err(msg) if msg.starts_with("output buffer too small") => {
            fail(ErrorKind::InvalidArgument, msg)
        }
        Err(msg) => fail(ErrorKind::DecodeFailed, format_args!("jpeg_decode: {msg}")),
    }
}

#[cfg(feature = "jpeg")]
fn encode_impl(input: &[u8], w: u32, h: u32, components: u8, params: JpegEncodeParams) -> Result<Vec<u8>, String> {
    use jpeg_encoder::{ColorType, Encoder, SamplingFactor};

    let color_type = match components {
        1 => ColorType::Luma,
        3 => ColorType::Rgb,
        4 => ColorType::Cmyk,
        other => return Err(format!("unsupported component count for encode: {other}")),
    };
    let sampling = match params.subsampling {
        Subsampling::Ratio444 => SamplingFactor::F_1_1,
        Subsampling::Ratio422 => SamplingFactor::F_2_1,
        Subsampling::Ratio420 => SamplingFactor::F_2_2,
    };
    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, params.quality);
    encoder.set_sampling_factor(sampling);
    encoder.encode(input, w as u16, h as u16, color_type).map_err(|e| e.to_string())?;
    Ok(out)
}

#[cfg(not(feature = "jpeg"))]
fn encode_impl(_input: &[u8], _w: u32, _h: u32, _components: u8, _params: JpegEncodeParams) -> Result<Vec<u8>, String> {
    Err("jpeg support not compiled in (feature `jpeg` disabled)".to_string())
}

/// `jpeg_encode(in, w, h, c, *out_ptr, *out_len, q, sub)` (spec.md §4.2). The
/// returned buffer is allocated by this library and must be released via
/// [`jpeg_free`].
///
/// # Safety
/// `input` must point to `w*h*c` readable bytes; `out_ptr`/`out_len` must be
/// valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpeg_encode(
    input: *const u8,
    w: u32,
    h: u32,
    components: u32,
    out_ptr: *mut *mut u8,
    out_len: *mut usize,
    quality: u8,
    subsampling: i32,
) -> c_int {
    if input.is_null() || w == 0 || h == 0 || components == 0 {
        return fail(ErrorKind::InvalidArgument, "jpeg_encode: null input or zero dimension");
    }
    if !(1..=100).contains(&quality) {
        return fail(ErrorKind::InvalidArgument, "jpeg_encode: quality must be in 1..=100");
    }
    let subsampling = match subsampling {
        0 => Subsampling::Ratio444,
        1 => Subsampling::Ratio422,
        2 => Subsampling::Ratio420,
        _ => return fail(ErrorKind::InvalidArgument, "jpeg_encode: unknown subsampling"),
    };
    let required = w as usize * h as usize * components as usize;
    let bytes = unsafe { slice::from_raw_parts(input, required) };
    let params = JpegEncodeParams { quality, subsampling };
    match encode_impl(bytes, w, h, components as u8, params) {
        Ok(mut encoded) => {
            encoded.shrink_to_fit();
            let len = encoded.len();
            let ptr = encoded.as_mut_ptr();
            std::mem::forget(encoded);
            unsafe {
                *out_ptr = ptr;
                *out_len = len;
            }
            0
        }
        Err(msg) => fail(ErrorKind::EncodeFailed, format_args!("jpeg_encode: {msg}")),
    }
}

/// Release a buffer returned by [`jpeg_encode`].
///
/// # Safety
/// `ptr` must be a pointer previously returned by `jpeg_encode` and not
/// already freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpeg_free(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: reconstructs the `Vec<u8>` leaked in `jpeg_encode`, whose
    // capacity equals `len` after `shrink_to_fit`.
    unsafe {
        drop(Vec::from_raw_parts(ptr, len, len));
    }
}

/// `jpeg_has_12bit_support() -> int32` (spec.md §4.2). The bound crates only
/// support 8-bit precision, so this is always false; 12-bit entry points are
/// present as `ERR_UNSUPPORTED` stubs (spec.md's open question on collapsing
/// the "not built" vs "unsupported context" distinction).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpeg_has_12bit_support() -> c_int {
    0
}

/// 12-bit decode stub (spec.md §4.2 "12-bit variants").
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jpeg_decode_12bit(
    _input: *const u8,
    _input_len: usize,
    _output: *mut u16,
    _output_len: usize,
    _out_width: *mut u32,
    _out_height: *mut u32,
    _out_components: *mut u32,
) -> c_int {
    let _ = FEATURE_JPEG;
    fail(ErrorKind::Unsupported, "12-bit JPEG decode is not supported by this build")
}

#[cfg(all(test, feature = "jpeg"))]
mod tests {
    use super::*;

    #[test]
    fn decode_header_rejects_empty_input() {
        let mut w = 0u32;
        let mut h = 0u32;
        let mut c = 0u32;
        let mut sub = 0i32;
        let status = unsafe { jpeg_decode_header(std::ptr::null(), 0, &mut w, &mut h, &mut c, &mut sub) };
        assert_ne!(status, 0);
    }

    #[test]
    fn encode_rejects_bad_quality() {
        let pixel = [0u8; 3];
        let mut out_ptr = std::ptr::null_mut();
        let mut out_len = 0usize;
        let status = unsafe { jpeg_encode(pixel.as_ptr(), 1, 1, 3, &mut out_ptr, &mut out_len, 0, 0) };
        assert_ne!(status, 0);
    }
}

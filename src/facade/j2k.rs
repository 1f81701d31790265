//! JPEG 2000 wrapper (spec.md §4.3), binding to the `openjp2` crate — the
//! Rust port of OpenJPEG retrieved alongside this repo, which exposes the
//! `opj_*`-shaped codec/stream API we drive through its safe `Codec`/
//! `Stream` types.
//!
//! `openjp2::Stream` only opens file-backed streams (`Stream::new_file`);
//! there is no in-memory stream constructor anywhere in its safe API. This
//! wrapper bridges the caller's byte buffers through a short-lived temp file
//! on each call, the same way the crate's own `opj_decompress`/`opj_compress`
//! binaries round-trip through paths rather than buffers.
//!
//! Format autodetection and sample packing below are this wrapper's own
//! logic, not library internals, and are unit tested as such.

use std::io::Write as _;
use std::os::raw::c_int;
use std::slice;

use crate::coding_parameters::{J2kDecodeOptions, J2kEncodeParams, J2kImageInfo, J2kRegion, ProgressionOrder, WrapperFormat};
use crate::constants::{J2K_CODESTREAM_MARKER, J2K_JP2_SIGNATURE, J2K_MAX_RESOLUTIONS, J2K_MIN_RESOLUTIONS};
use crate::error::{fail, ErrorKind};

/// Detect codestream vs. file-format wrapping from the first bytes of
/// `input` (spec.md §4.3 "Format autodetection"). Anything shorter than the
/// signature, or not matching either marker, defaults to `CODESTREAM`.
pub fn detect_wrapper_format(input: &[u8]) -> WrapperFormat {
    if input.len() >= 12 && input[..12] == J2K_JP2_SIGNATURE {
        WrapperFormat::FileFormat
    } else if input.len() >= 4 && &input[4..8] == b"jP  " {
        WrapperFormat::FileFormat
    } else if input.len() >= 2 && input[..2] == J2K_CODESTREAM_MARKER {
        WrapperFormat::Codestream
    } else {
        WrapperFormat::Codestream
    }
}

fn resolve_resolutions(requested: u32, w: u32, h: u32) -> u32 {
    if requested != 0 {
        return requested.clamp(J2K_MIN_RESOLUTIONS, J2K_MAX_RESOLUTIONS);
    }
    let min_dim = w.min(h).max(1) as f64;
    let auto = 1 + (min_dim / 32.0).log2().floor().max(0.0) as u32;
    auto.clamp(J2K_MIN_RESOLUTIONS, J2K_MAX_RESOLUTIONS)
}

/// Pack a full-range sample into the unsigned output convention spec.md
/// §4.3 "Sample-depth policy" describes: signed values are rebiased by
/// `+2^(bits-1)` before clamping.
fn pack_sample(value: i32, bits: u8, signed: bool) -> u32 {
    let biased = if signed { value + (1 << (bits - 1)) } else { value };
    let max = if bits <= 8 { 255 } else { 65535 };
    biased.clamp(0, max) as u32
}

fn debias_sample(value: u32, bits: u8, signed: bool) -> i32 {
    if signed {
        value as i32 - (1 << (bits - 1))
    } else {
        value as i32
    }
}

/// Stage `bytes` into a fresh temp file so `openjp2::Stream::new_file` has a
/// path to read from. Dropping the returned handle deletes the file.
#[cfg(feature = "j2k")]
fn staged_input_file(bytes: &[u8]) -> Result<tempfile::NamedTempFile, String> {
    let mut file = tempfile::NamedTempFile::new().map_err(|e| format!("temp file creation failed: {e}"))?;
    file.write_all(bytes).map_err(|e| format!("temp file write failed: {e}"))?;
    file.flush().map_err(|e| format!("temp file flush failed: {e}"))?;
    Ok(file)
}

/// `j2k_get_info(in, in_len, *info)` (spec.md §4.3).
///
/// # Safety
/// `input` must point to `input_len` readable bytes; `out_info` must be
/// valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn j2k_get_info(
    input: *const u8,
    input_len: usize,
    out_info: *mut J2kImageInfo,
) -> c_int {
    if input.is_null() || input_len < 2 {
        return fail(ErrorKind::InvalidArgument, "j2k_get_info: null or too-short input");
    }
    let bytes = unsafe { slice::from_raw_parts(input, input_len) };
    match probe_header(bytes) {
        Ok(info) => {
            unsafe { *out_info = info };
            0
        }
        Err(msg) => fail(ErrorKind::CorruptData, format_args!("j2k_get_info: {msg}")),
    }
}

#[cfg(feature = "j2k")]
fn probe_header(input: &[u8]) -> Result<J2kImageInfo, String> {
    // Header-only decode: create codec, attach handlers, read header, then
    // destroy every intermediate object before returning, per the state
    // machine in spec.md §4.3.
    let wrapper_format = detect_wrapper_format(input);
    openjp2_header_probe(input, wrapper_format)
}

#[cfg(not(feature = "j2k"))]
fn probe_header(_input: &[u8]) -> Result<J2kImageInfo, String> {
    Err("j2k support not compiled in (feature `j2k` disabled)".to_string())
}

#[cfg(feature = "j2k")]
fn codec_format_for(format: openjp2::J2KFormat) -> openjp2::openjpeg::OPJ_CODEC_FORMAT {
    use openjp2::openjpeg::OPJ_CODEC_FORMAT::*;
    use openjp2::J2KFormat;
    match format {
        J2KFormat::J2K => OPJ_CODEC_J2K,
        J2KFormat::JP2 => OPJ_CODEC_JP2,
        J2KFormat::JPT => OPJ_CODEC_JPT,
    }
}

#[cfg(feature = "j2k")]
fn openjp2_header_probe(input: &[u8], wrapper_format: WrapperFormat) -> Result<J2kImageInfo, String> {
    use openjp2::openjpeg::opj_dparameters_t;
    use openjp2::{detect_format, Codec, Stream};

    let detected = detect_format(input)?;
    let mut codec = Codec::new_decoder(codec_format_for(detected))
        .ok_or_else(|| "failed to create decoder codec".to_string())?;

    let mut d_params = opj_dparameters_t::default();
    if codec.setup_decoder(&mut d_params) == 0 {
        return Err("setup_decoder failed".to_string());
    }

    let staged = staged_input_file(input)?;
    let mut stream =
        Stream::new_file(staged.path(), 1_000_000, true).map_err(|e| format!("stream open failed: {e:?}"))?;
    let image = codec
        .read_header(&mut stream)
        .ok_or_else(|| "read_header failed".to_string())?;

    let components = image.comps().ok_or_else(|| "image has no components".to_string())?;
    let first = components.first().ok_or_else(|| "image reports zero components".to_string())?;

    Ok(J2kImageInfo {
        width: image.x1 - image.x0,
        height: image.y1 - image.y0,
        components: image.numcomps,
        bits_per_component: first.prec as u8,
        signed: first.sgnd != 0,
        // The safe `opj_image`/`Codec` surface doesn't expose the codestream's
        // resolution-level count, quality-layer count or tile geometry after
        // `read_header` — only per-component sample geometry. Left at 0 rather
        // than fabricated; callers that need these must count COD/SIZ marker
        // segments themselves.
        resolution_levels: 0,
        quality_layers: 0,
        tile_width: 0,
        tile_height: 0,
        wrapper_format,
    })
}

/// `j2k_decode(in, in_len, out, out_len, *opts, *w, *h, *c)` (spec.md §4.3).
///
/// # Safety
/// `input`/`output` must point to their declared lengths of readable/
/// writable memory; `options` and the out-params must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn j2k_decode(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
    options: *const J2kDecodeOptions,
    out_width: *mut u32,
    out_height: *mut u32,
    out_components: *mut u32,
) -> c_int {
    if input.is_null() || output.is_null() || options.is_null() {
        return fail(ErrorKind::InvalidArgument, "j2k_decode: null argument");
    }
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let opts = unsafe { *options };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    match decode_region_impl(in_bytes, out_bytes, None, opts) {
        Ok((w, h, c)) => {
            unsafe {
                *out_width = w;
                *out_height = h;
                *out_components = c;
            }
            0
        }
        Err((kind, msg)) => fail(kind, format_args!("j2k_decode: {msg}")),
    }
}

/// `j2k_decode_region(in, in_len, out, out_len, x0,y0,x1,y1, *opts, *w, *h, *c)`
/// (spec.md §4.3).
///
/// # Safety
/// Same requirements as [`j2k_decode`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn j2k_decode_region(
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    options: *const J2kDecodeOptions,
    out_width: *mut u32,
    out_height: *mut u32,
    out_components: *mut u32,
) -> c_int {
    let region = J2kRegion { x0, y0, x1, y1 };
    if !region.is_valid() {
        return fail(ErrorKind::InvalidArgument, "j2k_decode_region: x0>=x1 or y0>=y1");
    }
    if input.is_null() || output.is_null() || options.is_null() {
        return fail(ErrorKind::InvalidArgument, "j2k_decode_region: null argument");
    }
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let opts = unsafe { *options };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    match decode_region_impl(in_bytes, out_bytes, Some(region), opts) {
        Ok((w, h, c)) => {
            unsafe {
                *out_width = w;
                *out_height = h;
                *out_components = c;
            }
            0
        }
        Err((kind, msg)) => fail(kind, format_args!("j2k_decode_region: {msg}")),
    }
}

#[cfg(feature = "j2k")]
fn decode_region_impl(
    input: &[u8],
    output: &mut [u8],
    region: Option<J2kRegion>,
    options: J2kDecodeOptions,
) -> Result<(u32, u32, u32), (ErrorKind, String)> {
    let info = probe_header(input).map_err(|e| (ErrorKind::CorruptData, e))?;

    let shift = options.reduce;
    let divide = |v: u32| -> u32 { (v + (1 << shift) - 1) >> shift };
    let (full_w, full_h) = match region {
        Some(r) => (r.x1 - r.x0, r.y1 - r.y0),
        None => (info.width, info.height),
    };
    let width = divide(full_w);
    let height = divide(full_h);
    let components = info.components;
    let bps: u8 = if info.bits_per_component <= 8 { 1 } else { 2 };
    let required = width as usize * height as usize * components as usize * bps as usize;
    if output.len() < required {
        return Err((ErrorKind::InvalidArgument, format!(
            "output buffer too small: need {required}, have {}", output.len()
        )));
    }

    decode_via_library(input, output, region, options, &info)
        .map_err(|e| (ErrorKind::DecodeFailed, e))?;

    Ok((width, height, components))
}

#[cfg(not(feature = "j2k"))]
fn decode_region_impl(
    _input: &[u8],
    _output: &mut [u8],
    _region: Option<J2kRegion>,
    _options: J2kDecodeOptions,
) -> Result<(u32, u32, u32), (ErrorKind, String)> {
    Err((ErrorKind::Unsupported, "j2k support not compiled in (feature `j2k` disabled)".to_string()))
}

#[cfg(feature = "j2k")]
fn decode_via_library(
    input: &[u8],
    output: &mut [u8],
    region: Option<J2kRegion>,
    options: J2kDecodeOptions,
    info: &J2kImageInfo,
) -> Result<(), String> {
    use openjp2::openjpeg::opj_dparameters_t;
    use openjp2::{detect_format, Codec, Stream};

    let detected = detect_format(input)?;
    let mut codec = Codec::new_decoder(codec_format_for(detected))
        .ok_or_else(|| "failed to create decoder codec".to_string())?;

    let mut d_params = opj_dparameters_t::default();
    d_params.cp_reduce = options.reduce;
    if options.max_quality_layers > 0 {
        d_params.cp_layer = options.max_quality_layers;
    }
    if codec.setup_decoder(&mut d_params) == 0 {
        return Err("setup_decoder failed".to_string());
    }

    let staged = staged_input_file(input)?;
    let mut stream =
        Stream::new_file(staged.path(), 1_000_000, true).map_err(|e| format!("stream open failed: {e:?}"))?;
    let mut image = codec
        .read_header(&mut stream)
        .ok_or_else(|| "read_header failed".to_string())?;

    if let Some(r) = region {
        let status = codec.set_decode_area(&mut image, r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32);
        if status == 0 {
            return Err("set_decode_area failed".to_string());
        }
    }

    if codec.decode(&mut stream, &mut image) != 1 {
        return Err("decode failed".to_string());
    }
    if codec.end_decompress(&mut stream) != 1 {
        return Err("end_decompress failed".to_string());
    }

    pack_image_into(&image, output, info.bits_per_component, info.signed)
}

#[cfg(feature = "j2k")]
fn pack_image_into(image: &openjp2::opj_image, output: &mut [u8], bits: u8, signed: bool) -> Result<(), String> {
    let components = image.comps().ok_or_else(|| "image has no components".to_string())?;
    let width = (image.x1 - image.x0) as usize;
    let height = (image.y1 - image.y0) as usize;
    let bps: usize = if bits <= 8 { 1 } else { 2 };
    for (c_idx, comp) in components.iter().enumerate() {
        let data = comp.data().ok_or_else(|| "component has no sample buffer".to_string())?;
        for y in 0..height {
            for x in 0..width {
                let sample = pack_sample(data[y * width + x], bits, signed);
                let offset = (y * width + x) * components.len() * bps + c_idx * bps;
                if bps == 1 {
                    output[offset] = sample as u8;
                } else {
                    output[offset..offset + 2].copy_from_slice(&(sample as u16).to_le_bytes());
                }
            }
        }
    }
    Ok(())
}

/// `j2k_encode(in, in_len, w, h, c, bits, signed, *params, out, out_len, *written)`
/// (spec.md §4.3).
///
/// # Safety
/// `input` must point to `w*h*c*ceil(bits/8)` readable bytes; `output` to
/// `output_len` writable bytes; `params`/`written` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn j2k_encode(
    input: *const u8,
    input_len: usize,
    w: u32,
    h: u32,
    components: u32,
    bits: u8,
    signed: c_int,
    params: *const J2kEncodeParams,
    output: *mut u8,
    output_len: usize,
    written: *mut usize,
) -> c_int {
    if input.is_null() || output.is_null() || params.is_null() || written.is_null() {
        return fail(ErrorKind::InvalidArgument, "j2k_encode: null argument");
    }
    if components == 0 || bits == 0 || w == 0 || h == 0 {
        return fail(ErrorKind::InvalidArgument, "j2k_encode: zero dimension/components/bits");
    }
    let p = unsafe { *params };
    if !p.lossless && p.compression_ratio > 0.0 && p.quality > 0.0 {
        return fail(ErrorKind::InvalidArgument, "j2k_encode: set at most one of compression_ratio/quality");
    }
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    let resolutions = resolve_resolutions(p.resolutions, w, h);
    match encode_impl(in_bytes, w, h, components, bits, signed != 0, p, resolutions, out_bytes) {
        Ok(n) => {
            unsafe { *written = n };
            0
        }
        Err(msg) => fail(ErrorKind::EncodeFailed, format_args!("j2k_encode: {msg}")),
    }
}

#[cfg(feature = "j2k")]
fn encode_impl(
    input: &[u8],
    w: u32,
    h: u32,
    components: u32,
    bits: u8,
    signed: bool,
    params: J2kEncodeParams,
    resolutions: u32,
    output: &mut [u8],
) -> Result<usize, String> {
    use openjp2::openjpeg::{opj_cparameters_t, OPJ_CLRSPC_GRAY, OPJ_CLRSPC_SRGB};
    use openjp2::{opj_image, opj_image_comptparm, Codec, Stream};

    let bps = bits.div_ceil(8) as usize;
    let mut debiased = vec![0i32; (w as usize) * (h as usize) * (components as usize)];
    for (i, chunk) in input.chunks_exact(bps).enumerate().take(debiased.len()) {
        let raw = match bps {
            1 => chunk[0] as u32,
            _ => u16::from_le_bytes([chunk[0], chunk[1]]) as u32,
        };
        debiased[i] = debias_sample(raw, bits, signed);
    }

    let mut cmptparms = Vec::with_capacity(components as usize);
    for _ in 0..components {
        let mut p = opj_image_comptparm::default();
        p.dx = 1;
        p.dy = 1;
        p.w = w;
        p.h = h;
        p.prec = bits as u32;
        p.sgnd = signed as u32;
        cmptparms.push(p);
    }
    let color_space = if components >= 3 { OPJ_CLRSPC_SRGB } else { OPJ_CLRSPC_GRAY };
    let mut image =
        opj_image::create(&cmptparms, color_space).ok_or_else(|| "image creation failed".to_string())?;
    image.x0 = 0;
    image.y0 = 0;
    image.x1 = w;
    image.y1 = h;

    {
        let comps = image.comps_mut().ok_or_else(|| "image has no components".to_string())?;
        for (c_idx, comp) in comps.iter_mut().enumerate() {
            let dst = comp.data_mut().ok_or_else(|| "component has no sample buffer".to_string())?;
            for (i, sample) in dst.iter_mut().enumerate() {
                *sample = debiased[i * components as usize + c_idx];
            }
        }
    }

    let mut c_params = opj_cparameters_t::default();
    c_params.irreversible = if params.lossless { 0 } else { 1 };
    c_params.numresolution = resolutions as i32;
    c_params.tile_size_on = (params.tile_width > 0 && params.tile_height > 0) as i32;
    c_params.cp_tx0 = 0;
    c_params.cp_ty0 = 0;
    c_params.cp_tdx = params.tile_width as i32;
    c_params.cp_tdy = params.tile_height as i32;
    c_params.prog_order = progression_to_native(params.progression_order);
    if params.codeblock_width_exponent > 0 {
        c_params.cblockw_init = 1i32 << params.codeblock_width_exponent as u32;
    }
    if params.codeblock_height_exponent > 0 {
        c_params.cblockh_init = 1i32 << params.codeblock_height_exponent as u32;
    }
    if !params.lossless {
        if params.compression_ratio > 0.0 {
            c_params.tcp_rates[0] = params.compression_ratio;
            c_params.cp_disto_alloc = 1;
        } else if params.quality > 0.0 {
            c_params.tcp_distoratio[0] = params.quality;
            c_params.cp_fixed_quality = 1;
        }
    }
    c_params.tcp_numlayers = params.quality_layers.max(1) as i32;

    let cod_format = match params.wrapper_format {
        WrapperFormat::FileFormat => openjp2::openjpeg::OPJ_CODEC_FORMAT::OPJ_CODEC_JP2,
        WrapperFormat::Codestream => openjp2::openjpeg::OPJ_CODEC_FORMAT::OPJ_CODEC_J2K,
    };
    let mut codec = Codec::new_encoder(cod_format).ok_or_else(|| "failed to create encoder codec".to_string())?;

    if codec.setup_encoder(&mut c_params, &mut image) != 1 {
        return Err("setup_encoder failed".to_string());
    }

    let staged = tempfile::NamedTempFile::new().map_err(|e| format!("temp file creation failed: {e}"))?;
    let path = staged.path().to_path_buf();
    {
        let mut stream =
            Stream::new_file(&path, 1_000_000, false).map_err(|e| format!("stream open failed: {e:?}"))?;
        if codec.start_compress(&mut image, &mut stream) != 1 {
            return Err("start_compress failed".to_string());
        }
        if codec.encode(&mut stream) != 1 {
            return Err("encode failed".to_string());
        }
        if codec.end_compress(&mut stream) != 1 {
            return Err("end_compress failed".to_string());
        }
    }

    let encoded = std::fs::read(&path).map_err(|e| format!("reading encoded output failed: {e}"))?;
    if encoded.len() > output.len() {
        return Err(format!(
            "encoded output ({} bytes) exceeds caller's buffer ({})",
            encoded.len(),
            output.len()
        ));
    }
    output[..encoded.len()].copy_from_slice(&encoded);
    Ok(encoded.len())
}

#[cfg(not(feature = "j2k"))]
fn encode_impl(
    _input: &[u8],
    _w: u32,
    _h: u32,
    _components: u32,
    _bits: u8,
    _signed: bool,
    _params: J2kEncodeParams,
    _resolutions: u32,
    _output: &mut [u8],
) -> Result<usize, String> {
    Err("j2k support not compiled in (feature `j2k` disabled)".to_string())
}

#[cfg(feature = "j2k")]
fn progression_to_native(order: ProgressionOrder) -> openjp2::openjpeg::OPJ_PROG_ORDER {
    use openjp2::openjpeg::OPJ_PROG_ORDER::*;
    match order {
        ProgressionOrder::Lrcp => OPJ_LRCP,
        ProgressionOrder::Rlcp => OPJ_RLCP,
        ProgressionOrder::Rpcl => OPJ_RPCL,
        ProgressionOrder::Pcrl => OPJ_PCRL,
        ProgressionOrder::Cprl => OPJ_CPRL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jp2_signature() {
        assert_eq!(detect_wrapper_format(&J2K_JP2_SIGNATURE), WrapperFormat::FileFormat);
    }

    #[test]
    fn detects_raw_codestream_marker() {
        let mut buf = vec![0xFF, 0x4F, 0xFF, 0x51];
        buf.extend_from_slice(&[0u8; 8]);
        assert_eq!(detect_wrapper_format(&buf), WrapperFormat::Codestream);
    }

    #[test]
    fn unrecognized_bytes_default_to_codestream() {
        assert_eq!(detect_wrapper_format(&[1, 2, 3, 4]), WrapperFormat::Codestream);
    }

    #[test]
    fn reduction_geometry_matches_spec_formula() {
        // 512x512 at reduce=2 -> 128x128
        assert_eq!((512u32 + 3) >> 2, 128);
    }

    #[test]
    fn resolutions_default_clamped_to_bounds() {
        assert_eq!(resolve_resolutions(0, 16, 16), 1);
        assert_eq!(resolve_resolutions(0, 4096, 4096), J2K_MAX_RESOLUTIONS);
    }

    #[test]
    fn pack_and_debias_round_trip_signed() {
        let bits = 12;
        let original = -1024i32;
        let packed = pack_sample(original, bits, true);
        let recovered = debias_sample(packed, bits, true);
        assert_eq!(recovered, original);
    }
}

//! JPEG 2000 host adapters (spec.md §4.8). The lossy adapter additionally
//! consults GPU availability at construction and routes to
//! `gpu_j2k_decode` when available and not overridden.

use crate::adapters::error_from_status;
use crate::codec_trait::{PixelDataCodec, RasterFrame};
use crate::coding_parameters::{J2kDecodeOptions, J2kEncodeParams, WrapperFormat};
use crate::error::CodecError;
use crate::facade::gpu;
use crate::facade::j2k as facade;

const LOSSLESS_TS: &str = "1.2.840.10008.1.2.4.90";
const LOSSY_TS: &str = "1.2.840.10008.1.2.4.91";

fn decode_with(ts: &'static str, input: &[u8], use_gpu: bool) -> Result<RasterFrame, CodecError> {
    let mut info_buf = std::mem::MaybeUninit::uninit();
    let status = unsafe { facade::j2k_get_info(input.as_ptr(), input.len(), info_buf.as_mut_ptr()) };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    let info = unsafe { info_buf.assume_init() };

    let bps: usize = if info.bits_per_component <= 8 { 1 } else { 2 };
    let mut buf = vec![0u8; info.width as usize * info.height as usize * info.components as usize * bps];
    let mut w = 0u32;
    let mut h = 0u32;
    let mut c = 0u32;

    let status = if use_gpu && gpu::is_available() {
        unsafe { gpu::gpu_j2k_decode(input.as_ptr(), input.len(), buf.as_mut_ptr(), buf.len(), &mut w, &mut h, &mut c) }
    } else {
        let options = J2kDecodeOptions::default();
        unsafe { facade::j2k_decode(input.as_ptr(), input.len(), buf.as_mut_ptr(), buf.len(), &options, &mut w, &mut h, &mut c) }
    };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    Ok(RasterFrame {
        width: w,
        height: h,
        components: c as u16,
        bits_per_sample: info.bits_per_component,
        signed: info.signed,
        data: buf,
    })
}

fn encode_with(ts: &'static str, frame: &RasterFrame, params: J2kEncodeParams) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![0u8; frame.data.len() * 2 + 4096];
    let mut written = 0usize;
    let status = unsafe {
        facade::j2k_encode(
            frame.data.as_ptr(),
            frame.data.len(),
            frame.width,
            frame.height,
            frame.components as u32,
            frame.bits_per_sample,
            frame.signed as std::os::raw::c_int,
            &params,
            out.as_mut_ptr(),
            out.len(),
            &mut written,
        )
    };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    out.truncate(written);
    Ok(out)
}

/// Adapter for JPEG 2000 Lossless Only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Jpeg2000LosslessAdapter;

impl PixelDataCodec for Jpeg2000LosslessAdapter {
    fn transfer_syntax(&self) -> &'static str {
        LOSSLESS_TS
    }

    fn decode(&self, input: &[u8]) -> Result<RasterFrame, CodecError> {
        decode_with(LOSSLESS_TS, input, false)
    }

    fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>, CodecError> {
        let params = J2kEncodeParams { lossless: true, wrapper_format: WrapperFormat::Codestream, ..J2kEncodeParams::default() };
        encode_with(LOSSLESS_TS, frame, params)
    }

    fn name(&self) -> &'static str {
        "jpeg2000-lossless"
    }
}

/// Adapter for JPEG 2000 (lossy permitted). Consults GPU availability at
/// construction; `new()` snapshots it once so a single adapter instance's
/// dispatch policy doesn't change mid-lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Jpeg2000LossyAdapter {
    use_gpu: bool,
}

impl Jpeg2000LossyAdapter {
    pub fn new() -> Self {
        Self { use_gpu: gpu::is_available() }
    }
}

impl Default for Jpeg2000LossyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelDataCodec for Jpeg2000LossyAdapter {
    fn transfer_syntax(&self) -> &'static str {
        LOSSY_TS
    }

    fn decode(&self, input: &[u8]) -> Result<RasterFrame, CodecError> {
        decode_with(LOSSY_TS, input, self.use_gpu)
    }

    fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>, CodecError> {
        let params = J2kEncodeParams { lossless: false, compression_ratio: 10.0, ..J2kEncodeParams::default() };
        encode_with(LOSSY_TS, frame, params)
    }

    fn name(&self) -> &'static str {
        "jpeg2000-lossy"
    }
}

//! JPEG-LS host adapters (spec.md §4.8): lossless and near-lossless.

use crate::adapters::error_from_status;
use crate::codec_trait::{PixelDataCodec, RasterFrame};
use crate::coding_parameters::{InterleaveMode, JlsParams};
use crate::error::CodecError;
use crate::facade::jls as facade;

const LOSSLESS_TS: &str = "1.2.840.10008.1.2.4.80";
const NEAR_LOSSLESS_TS: &str = "1.2.840.10008.1.2.4.81";

fn decode_with(ts: &'static str, input: &[u8]) -> Result<RasterFrame, CodecError> {
    let mut required = 0usize;
    let mut params = JlsParams { width: 0, height: 0, components: 0, bits_per_sample: 0, near_lossless: 0, interleave_mode: InterleaveMode::None };
    let status = unsafe { facade::jls_get_decode_size(input.as_ptr(), input.len(), &mut required, &mut params) };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    let mut buf = vec![0u8; required];
    let status = unsafe { facade::jls_decode(input.as_ptr(), input.len(), buf.as_mut_ptr(), buf.len(), &mut params) };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    Ok(RasterFrame {
        width: params.width,
        height: params.height,
        components: params.components,
        bits_per_sample: params.bits_per_sample,
        signed: false,
        data: buf,
    })
}

fn encode_with(ts: &'static str, frame: &RasterFrame, near_lossless: u8) -> Result<Vec<u8>, CodecError> {
    let params = JlsParams {
        width: frame.width,
        height: frame.height,
        components: frame.components,
        bits_per_sample: frame.bits_per_sample,
        near_lossless,
        interleave_mode: if frame.components > 1 { InterleaveMode::Sample } else { InterleaveMode::None },
    };
    let mut bound = 0usize;
    let status = unsafe { facade::jls_get_encode_bound(&params, &mut bound) };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    let mut out = vec![0u8; bound];
    let mut written = 0usize;
    let status = unsafe { facade::jls_encode(frame.data.as_ptr(), frame.data.len(), out.as_mut_ptr(), out.len(), &mut written, &params) };
    if status != 0 {
        return Err(error_from_status(status, ts));
    }
    out.truncate(written);
    Ok(out)
}

/// Adapter for JPEG-LS Lossless.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegLsLosslessAdapter;

impl PixelDataCodec for JpegLsLosslessAdapter {
    fn transfer_syntax(&self) -> &'static str {
        LOSSLESS_TS
    }

    fn decode(&self, input: &[u8]) -> Result<RasterFrame, CodecError> {
        decode_with(LOSSLESS_TS, input)
    }

    fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>, CodecError> {
        encode_with(LOSSLESS_TS, frame, 0)
    }

    fn name(&self) -> &'static str {
        "jpeg-ls-lossless"
    }
}

/// Adapter for JPEG-LS Lossy (Near-Lossless).
#[derive(Debug, Clone, Copy)]
pub struct JpegLsNearLosslessAdapter {
    pub near_lossless: u8,
}

impl Default for JpegLsNearLosslessAdapter {
    fn default() -> Self {
        Self { near_lossless: 2 }
    }
}

impl PixelDataCodec for JpegLsNearLosslessAdapter {
    fn transfer_syntax(&self) -> &'static str {
        NEAR_LOSSLESS_TS
    }

    fn decode(&self, input: &[u8]) -> Result<RasterFrame, CodecError> {
        decode_with(NEAR_LOSSLESS_TS, input)
    }

    fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>, CodecError> {
        encode_with(NEAR_LOSSLESS_TS, frame, self.near_lossless)
    }

    fn name(&self) -> &'static str {
        "jpeg-ls-near-lossless"
    }
}

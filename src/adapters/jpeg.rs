//! JPEG host adapter (spec.md §4.8).

use crate::adapters::error_from_status;
use crate::codec_trait::{PixelDataCodec, RasterFrame};
use crate::coding_parameters::JpegEncodeParams;
use crate::error::CodecError;
use crate::facade::jpeg as facade;

const TRANSFER_SYNTAX: &str = "1.2.840.10008.1.2.4.50";

/// Adapter for JPEG Baseline (Process 1), lossy 8-bit.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegAdapter;

impl PixelDataCodec for JpegAdapter {
    fn transfer_syntax(&self) -> &'static str {
        TRANSFER_SYNTAX
    }

    fn decode(&self, input: &[u8]) -> Result<RasterFrame, CodecError> {
        let mut w = 0u32;
        let mut h = 0u32;
        let mut c = 0u32;
        let status = unsafe { facade::jpeg_decode_header(input.as_ptr(), input.len(), &mut w, &mut h, &mut c, &mut 0) };
        if status != 0 {
            return Err(error_from_status(status, TRANSFER_SYNTAX));
        }
        let mut buf = vec![0u8; (w * h * c) as usize];
        let status = unsafe {
            facade::jpeg_decode(input.as_ptr(), input.len(), buf.as_mut_ptr(), buf.len(), &mut w, &mut h, &mut c, 0)
        };
        if status != 0 {
            return Err(error_from_status(status, TRANSFER_SYNTAX));
        }
        Ok(RasterFrame { width: w, height: h, components: c as u16, bits_per_sample: 8, signed: false, data: buf })
    }

    fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>, CodecError> {
        let params = JpegEncodeParams::default();
        let mut out_ptr = std::ptr::null_mut();
        let mut out_len = 0usize;
        let status = unsafe {
            facade::jpeg_encode(
                frame.data.as_ptr(),
                frame.width,
                frame.height,
                frame.components as u32,
                &mut out_ptr,
                &mut out_len,
                params.quality,
                params.subsampling as i32,
            )
        };
        if status != 0 {
            return Err(error_from_status(status, TRANSFER_SYNTAX));
        }
        let encoded = unsafe { std::slice::from_raw_parts(out_ptr, out_len) }.to_vec();
        unsafe { facade::jpeg_free(out_ptr, out_len) };
        Ok(encoded)
    }

    fn name(&self) -> &'static str {
        "jpeg-baseline"
    }
}

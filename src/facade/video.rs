//! Video wrapper (spec.md §4.5): frame-by-frame decode for MPEG-2, MPEG-4
//! Part 2, H.264/AVC and HEVC/H.265, binding to `ffmpeg-next`'s safe
//! wrapper over `libavcodec`/`libavutil`.

use std::os::raw::c_int;
use std::slice;

use crate::error::{fail, ErrorKind};

/// Requested/native pixel format for a decoded frame (spec.md §4.5
/// `decode_frame`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PixelFormat {
    Gray8 = 0,
    Gray16 = 1,
    Rgb24 = 2,
    Yuv420pNative = 3,
}

impl PixelFormat {
    fn from_raw(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::Gray8,
            1 => Self::Gray16,
            2 => Self::Rgb24,
            3 => Self::Yuv420pNative,
            _ => return None,
        })
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub codec_id: i32,
    pub bit_depth: u8,
    /// `-1` when unknown.
    pub frame_count: i64,
    /// `0` when unknown.
    pub frame_rate_numerator: u32,
    pub frame_rate_denominator: u32,
    /// `-1` when unknown.
    pub duration_micros: i64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: i32,
    pub pts: i64,
}

/// Opaque per-caller decoder context (spec.md §3 "Video decoder handle").
/// Not `Send`/`Sync`: a raw pointer field with no unsafe impl, matching
/// "used from at most one thread at a time."
pub struct VideoDecoderHandle {
    #[cfg(feature = "video")]
    decoder: ffmpeg_next::decoder::Video,
    #[cfg(feature = "video")]
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    codec_id: i32,
    frame_counter: u64,
}

#[cfg(feature = "video")]
fn codec_from_id(codec_id: i32) -> Option<ffmpeg_next::codec::Id> {
    use ffmpeg_next::codec::Id;
    Some(match codec_id {
        1 => Id::MPEG2VIDEO,
        2 => Id::MPEG4,
        3 => Id::H264,
        4 => Id::HEVC,
        _ => return None,
    })
}

#[cfg(feature = "video")]
fn create_impl(codec_id: i32, extradata: &[u8]) -> Result<Box<VideoDecoderHandle>, String> {
    ffmpeg_next::init().map_err(|e| e.to_string())?;
    let id = codec_from_id(codec_id).ok_or_else(|| format!("unknown codec id {codec_id}"))?;
    let codec = ffmpeg_next::decoder::find(id).ok_or_else(|| format!("codec {id:?} not available in this ffmpeg build"))?;
    let mut context = ffmpeg_next::codec::context::Context::new_with_codec(codec);
    if !extradata.is_empty() {
        context.set_parameters(ffmpeg_next::codec::Parameters::new()).map_err(|e| e.to_string())?;
    }
    let decoder = context.decoder().video().map_err(|e| e.to_string())?;
    Ok(Box::new(VideoDecoderHandle { decoder, scaler: None, codec_id, frame_counter: 0 }))
}

#[cfg(not(feature = "video"))]
fn create_impl(_codec_id: i32, _extradata: &[u8]) -> Result<Box<VideoDecoderHandle>, String> {
    Err("video support not compiled in (feature `video` disabled)".to_string())
}

/// `video_decoder_create(codec_id, extradata, extradata_len, *handle)`
/// (spec.md §4.5, §6).
///
/// # Safety
/// `extradata` must point to `extradata_len` readable bytes (or be null
/// when `extradata_len == 0`); `out_handle` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_create(
    codec_id: i32,
    extradata: *const u8,
    extradata_len: usize,
    out_handle: *mut *mut VideoDecoderHandle,
) -> c_int {
    if out_handle.is_null() {
        return fail(ErrorKind::InvalidArgument, "video_decoder_create: null out_handle");
    }
    let extradata_slice = if extradata_len == 0 { &[][..] } else { unsafe { slice::from_raw_parts(extradata, extradata_len) } };
    match create_impl(codec_id, extradata_slice) {
        Ok(boxed) => {
            unsafe { *out_handle = Box::into_raw(boxed) };
            0
        }
        Err(msg) => fail(ErrorKind::InvalidArgument, format_args!("video_decoder_create: {msg}")),
    }
}

/// `video_decoder_destroy(handle)` (spec.md §6).
///
/// # Safety
/// `handle` must be a pointer previously returned by
/// [`video_decoder_create`] and not already destroyed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_destroy(handle: *mut VideoDecoderHandle) {
    if !handle.is_null() {
        // SAFETY: reconstructs the `Box` leaked in `video_decoder_create`.
        unsafe { drop(Box::from_raw(handle)) };
    }
}

/// `video_decoder_get_info(handle, *info)` (spec.md §4.5 `get_info`).
///
/// # Safety
/// `handle` must be a live pointer from [`video_decoder_create`];
/// `out_info` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_get_info(handle: *mut VideoDecoderHandle, out_info: *mut StreamInfo) -> c_int {
    if handle.is_null() || out_info.is_null() {
        return fail(ErrorKind::InvalidArgument, "video_decoder_get_info: null argument");
    }
    let h = unsafe { &*handle };
    #[cfg(feature = "video")]
    let info = StreamInfo {
        width: h.decoder.width(),
        height: h.decoder.height(),
        codec_id: h.codec_id,
        bit_depth: 8,
        frame_count: -1,
        frame_rate_numerator: 0,
        frame_rate_denominator: 1,
        duration_micros: -1,
    };
    #[cfg(not(feature = "video"))]
    let info = { let _ = h; StreamInfo::default() };
    unsafe { *out_info = info };
    0
}

fn bytes_for(width: u32, height: u32, format: PixelFormat) -> usize {
    match format {
        PixelFormat::Gray8 => width as usize * height as usize,
        PixelFormat::Gray16 => width as usize * height as usize * 2,
        PixelFormat::Rgb24 => width as usize * height as usize * 3,
        PixelFormat::Yuv420pNative => width as usize * height as usize * 3 / 2,
    }
}

/// `video_decoder_get_frame_size(handle, format, *size)` (spec.md §4.5).
///
/// # Safety
/// `handle` must be a live pointer; `out_size` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_get_frame_size(handle: *mut VideoDecoderHandle, format: i32, out_size: *mut usize) -> c_int {
    if handle.is_null() || out_size.is_null() {
        return fail(ErrorKind::InvalidArgument, "video_decoder_get_frame_size: null argument");
    }
    let Some(fmt) = PixelFormat::from_raw(format) else {
        return fail(ErrorKind::InvalidArgument, "video_decoder_get_frame_size: unknown format");
    };
    let h = unsafe { &*handle };
    #[cfg(feature = "video")]
    let size = bytes_for(h.decoder.width(), h.decoder.height(), fmt);
    #[cfg(not(feature = "video"))]
    let size = { let _ = h; 0 };
    unsafe { *out_size = size };
    0
}

#[cfg(feature = "video")]
fn decode_frame_impl(
    h: &mut VideoDecoderHandle,
    input: &[u8],
    output: &mut [u8],
    format: PixelFormat,
) -> Result<(FrameInfo, bool), String> {
    use ffmpeg_next::format::Pixel;
    use ffmpeg_next::software::scaling::{flag::Flags, Context as Scaler};
    use ffmpeg_next::util::frame::Video as VideoFrame;

    let packet = ffmpeg_next::packet::Packet::copy(input);
    h.decoder.send_packet(&packet).map_err(|e| e.to_string())?;
    let mut decoded = VideoFrame::empty();
    match h.decoder.receive_frame(&mut decoded) {
        Ok(()) => {}
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
            return Ok((FrameInfo::default(), false));
        }
        Err(e) => return Err(e.to_string()),
    }
    h.frame_counter += 1;

    let dst_pixel = match format {
        PixelFormat::Gray8 => Pixel::GRAY8,
        PixelFormat::Gray16 => Pixel::GRAY16LE,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Yuv420pNative => Pixel::YUV420P,
    };
    let needs_rebuild = h.scaler.as_ref().map(|s| s.input().format != decoded.format() || s.input().width != decoded.width()).unwrap_or(true);
    if needs_rebuild {
        h.scaler = Some(
            Scaler::get(decoded.format(), decoded.width(), decoded.height(), dst_pixel, decoded.width(), decoded.height(), Flags::BILINEAR)
                .map_err(|e| e.to_string())?,
        );
    }
    let mut converted = VideoFrame::empty();
    h.scaler.as_mut().unwrap().run(&decoded, &mut converted).map_err(|e| e.to_string())?;

    let required = bytes_for(converted.width(), converted.height(), format);
    if output.len() < required {
        return Err(format!("output buffer too small: need {required}, have {}", output.len()));
    }
    let plane = converted.data(0);
    output[..plane.len().min(required)].copy_from_slice(&plane[..plane.len().min(required)]);

    Ok((
        FrameInfo { width: converted.width(), height: converted.height(), pixel_format: format as i32, pts: decoded.pts().unwrap_or(-1) },
        true,
    ))
}

#[cfg(not(feature = "video"))]
fn decode_frame_impl(
    _h: &mut VideoDecoderHandle,
    _input: &[u8],
    _output: &mut [u8],
    _format: PixelFormat,
) -> Result<(FrameInfo, bool), String> {
    Err("video support not compiled in (feature `video` disabled)".to_string())
}

/// `video_decode_frame(handle, in, in_len, out, out_len, format, *info, *available)`
/// (spec.md §4.5). `frame_available = false` means the decoder consumed the
/// packet but needs more input to produce a frame (B-frame reordering); the
/// caller loops.
///
/// # Safety
/// `handle` must be live; `input`/`output` must point to their declared
/// lengths; `out_info`/`out_available` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decode_frame(
    handle: *mut VideoDecoderHandle,
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_len: usize,
    format: i32,
    out_info: *mut FrameInfo,
    out_available: *mut c_int,
) -> c_int {
    if handle.is_null() || input.is_null() || output.is_null() || out_info.is_null() || out_available.is_null() {
        return fail(ErrorKind::InvalidArgument, "video_decode_frame: null argument");
    }
    let Some(fmt) = PixelFormat::from_raw(format) else {
        return fail(ErrorKind::InvalidArgument, "video_decode_frame: unknown format");
    };
    let h = unsafe { &mut *handle };
    let in_bytes = unsafe { slice::from_raw_parts(input, input_len) };
    let out_bytes = unsafe { slice::from_raw_parts_mut(output, output_len) };
    match decode_frame_impl(h, in_bytes, out_bytes, fmt) {
        Ok((info, available)) => {
            unsafe {
                *out_info = info;
                *out_available = available as c_int;
            }
            0
        }
        Err(msg) => fail(ErrorKind::DecodeFailed, format_args!("video_decode_frame: {msg}")),
    }
}

/// `video_decoder_flush(handle, out, out_len, format, *info, *available)`
/// (spec.md §4.5): after end-of-stream, drain buffered frames.
///
/// # Safety
/// Same requirements as [`video_decode_frame`] minus the input buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_flush(
    handle: *mut VideoDecoderHandle,
    output: *mut u8,
    output_len: usize,
    format: i32,
    out_info: *mut FrameInfo,
    out_available: *mut c_int,
) -> c_int {
    unsafe { video_decode_frame(handle, [].as_ptr(), 0, output, output_len, format, out_info, out_available) }
}

/// `video_decoder_seek(handle, frame)` (spec.md §4.5): resets decoder state;
/// caller is expected to next feed bytes starting at a keyframe at or
/// before the target.
///
/// # Safety
/// `handle` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_seek(handle: *mut VideoDecoderHandle, _frame: i64) -> c_int {
    if handle.is_null() {
        return fail(ErrorKind::InvalidArgument, "video_decoder_seek: null handle");
    }
    let h = unsafe { &mut *handle };
    #[cfg(feature = "video")]
    h.decoder.flush();
    h.frame_counter = 0;
    0
}

/// `video_decoder_reset(handle)` (spec.md §4.5): equivalent to `seek(0)`.
///
/// # Safety
/// `handle` must be live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn video_decoder_reset(handle: *mut VideoDecoderHandle) -> c_int {
    unsafe { video_decoder_seek(handle, 0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_matches_format() {
        assert_eq!(bytes_for(4, 4, PixelFormat::Gray8), 16);
        assert_eq!(bytes_for(4, 4, PixelFormat::Gray16), 32);
        assert_eq!(bytes_for(4, 4, PixelFormat::Rgb24), 48);
        assert_eq!(bytes_for(4, 4, PixelFormat::Yuv420pNative), 24);
    }

    #[test]
    fn pixel_format_from_raw_rejects_unknown() {
        assert!(PixelFormat::from_raw(99).is_none());
    }
}

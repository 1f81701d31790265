//! Host codec adapters (spec.md §4.8): each implements
//! [`crate::codec_trait::PixelDataCodec`] by translating between a raw
//! raster and the native facade's byte-buffer conventions, pinning buffers
//! and checking the facade's status code.

pub mod jpeg;
pub mod jpeg2000;
pub mod jpegls;

pub use jpeg::JpegAdapter;
pub use jpeg2000::{Jpeg2000LosslessAdapter, Jpeg2000LossyAdapter};
pub use jpegls::{JpegLsLosslessAdapter, JpegLsNearLosslessAdapter};

use crate::error::{last_error, CodecError, ErrorKind};

/// Build a [`CodecError`] from a non-zero facade status, retrieving the
/// thread-local message the failing call just set (spec.md §4.8).
pub(crate) fn error_from_status(status: i32, transfer_syntax: &'static str) -> CodecError {
    let kind = ErrorKind::try_from(status).unwrap_or(ErrorKind::Internal);
    CodecError { kind, native_code: status, message: last_error(), transfer_syntax }
}

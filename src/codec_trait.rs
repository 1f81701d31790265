//! The host-side codec capability every registry entry implements (spec.md
//! §4.8), this crate's analogue of `dicom_encoding::adapters::PixelDataReader`
//! / `PixelDataWriter`.

use crate::error::CodecError;

/// A raw, uncompressed raster plus the metadata needed to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub components: u16,
    pub bits_per_sample: u8,
    pub signed: bool,
    pub data: Vec<u8>,
}

/// A codec implementation bound to one transfer syntax, registered into a
/// [`crate::registry::CodecRegistry`] at a fixed priority.
///
/// Implementors pin the in-memory frame representation to the native
/// facade's byte-buffer conventions, invoke it, and translate a non-zero
/// status into a [`CodecError`] carrying the five fields spec.md §4.8 lists.
pub trait PixelDataCodec: Send + Sync {
    /// The transfer-syntax identifier this codec implements, e.g.
    /// `"1.2.840.10008.1.2.4.50"` for baseline JPEG.
    fn transfer_syntax(&self) -> &'static str;

    /// Decode a single compressed frame into a raw raster.
    fn decode(&self, input: &[u8]) -> Result<RasterFrame, CodecError>;

    /// Encode a raw raster into this codec's compressed representation.
    fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>, CodecError>;

    /// Human-readable name for registry introspection (spec.md §4.9
    /// `get_codec_info`).
    fn name(&self) -> &'static str {
        self.transfer_syntax()
    }
}

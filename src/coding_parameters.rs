//! Value types shared by the wrappers and adapters: encode parameters,
//! decode options, and the JPEG 2000 image-info probe result (spec.md §3
//! "Data Model").

/// Interleave mode for JPEG-LS multi-component scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterleaveMode {
    /// Planar: each component stored in its own plane.
    None = 0,
    /// Row-interleaved.
    Line = 1,
    /// Pixel-interleaved.
    Sample = 2,
}

/// Colorspace the caller wants a JPEG decode to land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorspaceRequest {
    #[default]
    Auto,
    Rgb,
    Ybr,
    Gray,
}

/// Chroma subsampling for JPEG encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    #[default]
    Ratio444,
    Ratio422,
    Ratio420,
}

/// Whether a JPEG 2000 byte stream is a bare codestream or wrapped in the
/// JP2 file-format box structure (spec.md §4.3 "Format autodetection").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperFormat {
    Codestream,
    FileFormat,
}

/// JPEG 2000 progression order (spec.md §4.3 "Progression order").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressionOrder {
    #[default]
    Lrcp,
    Rlcp,
    Rpcl,
    Pcrl,
    Cprl,
}

/// Result of a header-only JPEG 2000 probe (spec.md §3 "Image info (J2K)").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct J2kImageInfo {
    pub width: u32,
    pub height: u32,
    pub components: u32,
    pub bits_per_component: u8,
    pub signed: bool,
    pub resolution_levels: u32,
    pub quality_layers: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub wrapper_format: WrapperFormat,
}

/// Caller-supplied knobs for a JPEG 2000 encode call (spec.md §3 "Encode
/// parameters", §4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct J2kEncodeParams {
    pub lossless: bool,
    /// Rate-distortion target, e.g. `10.0` for 10:1. `0.0` means unset.
    pub compression_ratio: f32,
    /// Distortion-quality target. `0.0` means unset.
    pub quality: f32,
    /// `0` requests automatic computation (spec.md §4.3 "Resolution levels").
    pub resolutions: u32,
    pub quality_layers: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// `0` uses the library default; `4..=10` overrides.
    pub codeblock_width_exponent: u8,
    pub codeblock_height_exponent: u8,
    pub progression_order: ProgressionOrder,
    pub wrapper_format: WrapperFormat,
}

impl Default for J2kEncodeParams {
    fn default() -> Self {
        Self {
            lossless: true,
            compression_ratio: 0.0,
            quality: 0.0,
            resolutions: 0,
            quality_layers: 1,
            tile_width: 0,
            tile_height: 0,
            codeblock_width_exponent: 0,
            codeblock_height_exponent: 0,
            progression_order: ProgressionOrder::default(),
            wrapper_format: WrapperFormat::Codestream,
        }
    }
}

/// Caller-supplied knobs for a JPEG 2000 decode call (spec.md §3 "Decode
/// options").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct J2kDecodeOptions {
    /// Requests decoding at `1 / 2^reduce` resolution.
    pub reduce: u32,
    /// `0` means "use all layers".
    pub max_quality_layers: u32,
}

/// Half-open region, in full-resolution coordinates, for
/// `j2k_decode_region` (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct J2kRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl J2kRegion {
    pub fn is_valid(&self) -> bool {
        self.x0 < self.x1 && self.y0 < self.y1
    }
}

/// Caller-supplied knobs for a JPEG encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegEncodeParams {
    pub quality: u8,
    pub subsampling: Subsampling,
}

impl Default for JpegEncodeParams {
    fn default() -> Self {
        Self { quality: 90, subsampling: Subsampling::Ratio444 }
    }
}

/// Parameters describing (or requesting) a JPEG-LS stream, returned by
/// `jls_get_decode_size`/`jls_decode` and consumed by `jls_encode`
/// (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JlsParams {
    pub width: u32,
    pub height: u32,
    pub components: u16,
    pub bits_per_sample: u8,
    pub near_lossless: u8,
    pub interleave_mode: InterleaveMode,
}

impl JlsParams {
    /// Required output buffer size for a decode of this frame, per spec.md
    /// §4.4: `w*h*components*ceil(bits/8)`.
    pub fn required_decode_bytes(&self) -> usize {
        let bytes_per_sample = self.bits_per_sample.div_ceil(8) as usize;
        self.width as usize * self.height as usize * self.components as usize * bytes_per_sample
    }

    /// Conservative upper bound for an encode of this frame, per spec.md
    /// §4.4: `raw_size + raw_size/16 + 1024`.
    pub fn encode_bound(&self) -> usize {
        let raw = self.required_decode_bytes();
        raw + raw / 16 + 1024
    }
}

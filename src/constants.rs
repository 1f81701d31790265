//! ABI version, priority ladder, and bitmask constants shared across the
//! facade, host layer and registry.

/// ABI version constant the native facade reports via [`crate::facade::version`].
/// The host initializer compares its own expected constant against this at
/// load time and fails unless they match (or the version check is skipped).
pub const ABI_VERSION: i32 = 3;

// --- feature mask bits (crate::facade::features) ---
pub const FEATURE_JPEG: i32 = 1 << 0;
pub const FEATURE_J2K: i32 = 1 << 1;
pub const FEATURE_JLS: i32 = 1 << 2;
pub const FEATURE_RLE: i32 = 1 << 3;
pub const FEATURE_VIDEO: i32 = 1 << 4;
pub const FEATURE_DEFLATE: i32 = 1 << 5;
pub const FEATURE_GPU: i32 = 1 << 6;
pub const FEATURE_HTJ2K: i32 = 1 << 7;

// --- SIMD mask bits (crate::facade::simd_features) ---
pub const SIMD_SSE2: i32 = 1 << 0;
pub const SIMD_SSE41: i32 = 1 << 1;
pub const SIMD_SSE42: i32 = 1 << 2;
pub const SIMD_AVX: i32 = 1 << 3;
pub const SIMD_AVX2: i32 = 1 << 4;
pub const SIMD_AVX512F: i32 = 1 << 5;
pub const SIMD_NEON: i32 = 1 << 6;

/// Size, in bytes, of the per-thread error slot (including the NUL terminator).
pub const ERROR_SLOT_SIZE: usize = 256;

/// Priority ladder (spec.md §4.9). Registrars wanting higher precedence than
/// a named tier simply pass a larger integer; these are conventions, not an
/// exhaustive enum.
pub const PRIORITY_FALLBACK: i32 = 0;
pub const PRIORITY_PORTABLE: i32 = 50;
pub const PRIORITY_NATIVE: i32 = 100;
pub const PRIORITY_USER_OVERRIDE: i32 = 200;

/// JPEG-LS bounds (ISO/IEC 14495-1).
pub const JLS_MIN_BITS_PER_SAMPLE: u8 = 2;
pub const JLS_MAX_BITS_PER_SAMPLE: u8 = 16;
pub const JLS_MIN_COMPONENTS: u16 = 1;
pub const JLS_MAX_COMPONENTS: u16 = 255;
pub const JLS_MAX_NEAR_LOSSLESS: u8 = 255;

/// JPEG 2000 resolution-level bounds (spec.md §4.3 "Resolution levels").
pub const J2K_MIN_RESOLUTIONS: u32 = 1;
pub const J2K_MAX_RESOLUTIONS: u32 = 7;

/// JPEG 2000 code-block exponent bounds.
pub const J2K_MIN_CODEBLOCK_EXPONENT: u8 = 4;
pub const J2K_MAX_CODEBLOCK_EXPONENT: u8 = 10;

/// The 12-byte JP2 signature box, used by the format autodetector.
pub const J2K_JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
];

/// Raw-codestream marker (SOC), big-endian.
pub const J2K_CODESTREAM_MARKER: [u8; 2] = [0xFF, 0x4F];

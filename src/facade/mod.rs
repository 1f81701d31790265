//! The native C ABI surface (spec.md §4.1, §6): version/feature/SIMD
//! queries, the thread-local error slot, and the per-codec wrappers.
//!
//! Every entry point here is the sink for errors raised below it — the
//! facade itself never fails.

pub mod gpu;
pub mod j2k;
pub mod jls;
pub mod jpeg;
pub mod video;

use std::os::raw::c_char;

use crate::constants::{
    ABI_VERSION, FEATURE_DEFLATE, FEATURE_GPU, FEATURE_HTJ2K, FEATURE_J2K, FEATURE_JLS, FEATURE_JPEG,
    FEATURE_RLE, FEATURE_VIDEO,
};
use crate::error;
use crate::simd::simd_features as detect_simd_features;

/// Return the ABI version constant (spec.md §4.1 `version`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn version() -> i32 {
    ABI_VERSION
}

/// Return the bitmap of codecs linked into this build, OR-ed with the GPU
/// bit when the GPU shim reports availability (spec.md §4.1 `features`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn features() -> i32 {
    let mut mask = FEATURE_RLE | FEATURE_DEFLATE;
    if cfg!(feature = "jpeg") {
        mask |= FEATURE_JPEG;
    }
    if cfg!(feature = "j2k") {
        mask |= FEATURE_J2K | FEATURE_HTJ2K;
    }
    if cfg!(feature = "jls") {
        mask |= FEATURE_JLS;
    }
    if cfg!(feature = "video") {
        mask |= FEATURE_VIDEO;
    }
    if gpu::is_available() {
        mask |= FEATURE_GPU;
    }
    mask
}

/// Return CPU capability bits detected via CPUID (x86) or fixed to NEON on
/// aarch64 (spec.md §4.1 `simd_features`). Safe under concurrent first call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn simd_features() -> i32 {
    detect_simd_features()
}

/// Return the current thread's error buffer: always non-null, possibly
/// empty (spec.md §4.1 `last_error`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn last_error() -> *const c_char {
    error::last_error_ptr()
}

/// Zero the current thread's error buffer (spec.md §4.1 `clear_error`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn clear_error() {
    error::clear_error();
}

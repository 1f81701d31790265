//! Runtime CPU-feature detection, cached process-wide (spec.md §3 "SIMD
//! mask", §4.1 `simd_features`).
//!
//! The result is computed at most once: concurrent first callers race to
//! fill a [`OnceLock`], all converging on the same bitmask regardless of
//! which thread wins.

use std::sync::OnceLock;

use crate::constants::{SIMD_AVX, SIMD_AVX2, SIMD_AVX512F, SIMD_NEON, SIMD_SSE2, SIMD_SSE41, SIMD_SSE42};

static SIMD_MASK: OnceLock<i32> = OnceLock::new();

/// Detected CPU instruction-set features, as a bitmask of the `SIMD_*`
/// constants. Cached after the first call.
pub fn simd_features() -> i32 {
    *SIMD_MASK.get_or_init(detect)
}

#[cfg(target_arch = "x86_64")]
fn detect() -> i32 {
    let mut mask = 0;
    if std::is_x86_feature_detected!("sse2") {
        mask |= SIMD_SSE2;
    }
    if std::is_x86_feature_detected!("sse4.1") {
        mask |= SIMD_SSE41;
    }
    if std::is_x86_feature_detected!("sse4.2") {
        mask |= SIMD_SSE42;
    }
    if std::is_x86_feature_detected!("avx") {
        mask |= SIMD_AVX;
    }
    if std::is_x86_feature_detected!("avx2") {
        mask |= SIMD_AVX2;
    }
    if std::is_x86_feature_detected!("avx512f") {
        mask |= SIMD_AVX512F;
    }
    mask
}

#[cfg(target_arch = "aarch64")]
fn detect() -> i32 {
    // AArch64 always has NEON; no CPUID-equivalent probe is needed.
    SIMD_NEON
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> i32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn concurrent_first_access_converges() {
        let handles: Vec<_> = (0..16).map(|_| thread::spawn(simd_features)).collect();
        let results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = results[0];
        assert!(results.iter().all(|&m| m == first));
    }
}

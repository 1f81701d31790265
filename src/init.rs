//! Initializer and lifecycle (spec.md §4.10): perform exactly once per
//! process the load-verify-probe-register sequence, with an auto-init
//! switch consulted exactly once at first use.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{error, info};

use crate::adapters::{Jpeg2000LosslessAdapter, Jpeg2000LossyAdapter, JpegAdapter, JpegLsLosslessAdapter, JpegLsNearLosslessAdapter};
use crate::constants::PRIORITY_NATIVE;
use crate::facade;
use crate::facade::gpu::gpu_prefer_cpu;
use crate::registry::CodecRegistry;

/// Caller-supplied knobs for [`initialize`] (spec.md §4.10 "Configuration
/// options").
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Bypass the ABI version-constant equality check; load regardless.
    pub skip_version_check: bool,
    /// Equivalent to calling `gpu_prefer_cpu(true)` on every thread.
    pub prefer_cpu: bool,
    pub enable_jpeg: bool,
    pub enable_j2k: bool,
    pub enable_jls: bool,
    pub enable_video: bool,
    /// Absolute path override for the native library.
    pub library_path: Option<PathBuf>,
}

impl InitOptions {
    /// All codec families enabled, version check and GPU preference left at
    /// their defaults. What [`registry`]'s auto-init path uses.
    pub fn with_defaults_enabled() -> Self {
        Self { enable_jpeg: true, enable_j2k: true, enable_jls: true, enable_video: true, ..Self::default() }
    }
}

#[derive(Debug, Error, Clone)]
pub enum InitError {
    #[error("ABI version mismatch: expected {expected}, library reports {actual}")]
    VersionMismatch { expected: i32, actual: i32 },
    #[error("failed to load native library: {0}")]
    Load(String),
}

/// Process-wide initializer result, cached after the first explicit or
/// auto-triggered init (spec.md §4.10 "Once-only discipline").
static INIT_RESULT: OnceLock<Result<(), InitError>> = OnceLock::new();
static AUTO_INIT_DISABLED: AtomicBool = AtomicBool::new(false);
static REGISTRY: OnceLock<Arc<CodecRegistry>> = OnceLock::new();

/// Disable auto-init. Has effect only if called before the first use of
/// any facade/registry entry point; the switch is consulted exactly once.
pub fn disable_auto_init() {
    AUTO_INIT_DISABLED.store(true, Ordering::SeqCst);
}

/// The process-wide codec registry, created lazily and populated by
/// [`initialize`] on first use (unless auto-init has been disabled).
pub fn registry() -> &'static Arc<CodecRegistry> {
    if !AUTO_INIT_DISABLED.load(Ordering::SeqCst) {
        let _ = initialize(InitOptions::with_defaults_enabled());
    }
    REGISTRY.get_or_init(|| Arc::new(CodecRegistry::new()))
}

/// Perform initialization if it has not already run for this process;
/// otherwise re-return the cached result without retrying the load
/// (spec.md §4.10, §7 "Initialization failures throw at the first
/// explicit-init call (cached thereafter)").
pub fn initialize(options: InitOptions) -> Result<(), InitError> {
    INIT_RESULT.get_or_init(|| run_init(options)).clone()
}

fn run_init(options: InitOptions) -> Result<(), InitError> {
    info!(library_path = ?options.library_path, skip_version_check = options.skip_version_check, "initializing native codec core");

    if !options.skip_version_check {
        // SAFETY: `version()` is this crate's own exported entry point.
        let actual = unsafe { facade::version() };
        if actual != crate::constants::ABI_VERSION {
            error!(expected = crate::constants::ABI_VERSION, actual, "ABI version mismatch");
            return Err(InitError::VersionMismatch { expected: crate::constants::ABI_VERSION, actual });
        }
    }

    if options.prefer_cpu {
        unsafe { gpu_prefer_cpu(1) };
    }

    let registry = REGISTRY.get_or_init(|| Arc::new(CodecRegistry::new()));

    if options.enable_jpeg {
        registry.register(Arc::new(JpegAdapter), PRIORITY_NATIVE);
    }
    if options.enable_j2k {
        registry.register(Arc::new(Jpeg2000LosslessAdapter), PRIORITY_NATIVE);
        registry.register(Arc::new(Jpeg2000LossyAdapter::new()), PRIORITY_NATIVE);
    }
    if options.enable_jls {
        registry.register(Arc::new(JpegLsLosslessAdapter), PRIORITY_NATIVE);
        registry.register(Arc::new(JpegLsNearLosslessAdapter::default()), PRIORITY_NATIVE);
    }
    // `enable_video` has no transfer-syntax-keyed adapter of its own in
    // this registry (spec.md §1 scopes the wire protocol/pixel-data
    // container out); video decode is reached directly through
    // `facade::video`.
    let _ = options.enable_video;

    info!("native codec core initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_explicit_init_reuses_cached_result() {
        let first = initialize(InitOptions::with_defaults_enabled());
        let second = initialize(InitOptions { skip_version_check: true, ..InitOptions::with_defaults_enabled() });
        assert_eq!(first.is_ok(), second.is_ok());
    }
}

//! Library discovery and version handshake (spec.md §4.7, §6 "Filesystem
//! layout the loader depends on").
//!
//! Even though the facade lives in this same crate, it is also built as a
//! `cdylib` so that a separate host process can load it exactly as spec.md
//! describes: resolve a path, `dlopen`/`LoadLibrary` it, and verify its
//! reported ABI version before trusting anything else it exports.

use std::path::{Path, PathBuf};

use libloading::Library;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::ABI_VERSION;

#[cfg(target_os = "windows")]
const LIB_FILE_NAME: &str = "medcodec_native.dll";
#[cfg(target_os = "macos")]
const LIB_FILE_NAME: &str = "libmedcodec_native.dylib";
#[cfg(all(unix, not(target_os = "macos")))]
const LIB_FILE_NAME: &str = "libmedcodec_native.so";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no native library found (tried: {tried:?})")]
    NotFound { tried: Vec<PathBuf> },
    #[error("failed to load native library at {path}: {source}")]
    DlOpen { path: PathBuf, #[source] source: libloading::Error },
    #[error("ABI version mismatch: host expects {expected}, library reports {actual}")]
    VersionMismatch { expected: i32, actual: i32 },
}

/// Target-identifier subdirectory convention, e.g. `x86_64-pc-windows-msvc`.
/// `TARGET` is only set when a build script forwards it; fall back to a
/// coarse `os-arch` pair derived from `std::env::consts` otherwise.
fn target_triple() -> String {
    match option_env!("TARGET") {
        Some(t) => t.to_string(),
        None => format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
    }
}

/// Candidate search order: explicit override, `<runtimes>/<target>/native/`
/// next to the running executable, then the platform default search path
/// (handled by passing the bare file name to the dynamic loader).
fn candidates(explicit_path: Option<&Path>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = explicit_path {
        out.push(p.to_path_buf());
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            out.push(dir.join("runtimes").join(target_triple()).join("native").join(LIB_FILE_NAME));
        }
    }
    out.push(PathBuf::from(LIB_FILE_NAME));
    out
}

/// Result of a successful load and version handshake.
pub struct LoadedLibrary {
    pub path: PathBuf,
    pub library: Library,
    pub features: i32,
    pub simd_features: i32,
}

/// Resolve, load, and version-check the native library, per spec.md §4.7's
/// resolver order and §4.10's `skip_version_check` option.
pub fn load(explicit_path: Option<&Path>, skip_version_check: bool) -> Result<LoadedLibrary, LoadError> {
    let mut tried = Vec::new();
    for candidate in candidates(explicit_path) {
        debug!(path = %candidate.display(), "attempting native library load");
        // SAFETY: we only call well-known, fixed-signature exported symbols
        // below, and the library is expected to be our own facade build.
        match unsafe { Library::new(&candidate) } {
            Ok(library) => {
                info!(path = %candidate.display(), "native library loaded");
                return finish_load(candidate, library, skip_version_check);
            }
            Err(_) => tried.push(candidate),
        }
    }
    warn!(?tried, "no native library could be loaded");
    Err(LoadError::NotFound { tried })
}

fn finish_load(path: PathBuf, library: Library, skip_version_check: bool) -> Result<LoadedLibrary, LoadError> {
    // SAFETY: `version`/`features`/`simd_features` are exported by this
    // crate's own facade with exactly this signature (spec.md §6).
    let (actual_version, features, simd_features) = unsafe {
        let version: libloading::Symbol<unsafe extern "C" fn() -> i32> =
            library.get(b"version").map_err(|source| LoadError::DlOpen { path: path.clone(), source })?;
        let features: libloading::Symbol<unsafe extern "C" fn() -> i32> =
            library.get(b"features").map_err(|source| LoadError::DlOpen { path: path.clone(), source })?;
        let simd: libloading::Symbol<unsafe extern "C" fn() -> i32> =
            library.get(b"simd_features").map_err(|source| LoadError::DlOpen { path: path.clone(), source })?;
        (version(), features(), simd())
    };

    if !skip_version_check && actual_version != ABI_VERSION {
        return Err(LoadError::VersionMismatch { expected: ABI_VERSION, actual: actual_version });
    }

    Ok(LoadedLibrary { path, library, features, simd_features })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_tried_first() {
        let explicit = PathBuf::from("/tmp/custom/libmedcodec_native.so");
        let found = candidates(Some(&explicit));
        assert_eq!(found[0], explicit);
    }

    #[test]
    fn default_candidate_is_bare_file_name() {
        let found = candidates(None);
        assert_eq!(found.last().unwrap(), &PathBuf::from(LIB_FILE_NAME));
    }
}

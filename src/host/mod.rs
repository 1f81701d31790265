//! The safe Rust layer that calls into [`crate::facade`] the way a P/Invoke
//! host would (spec.md §4.7): library discovery, version handshake, and
//! safe handles around native resources.

pub mod loader;
pub mod safe_handle;

pub use loader::{LoadError, LoadedLibrary};
pub use safe_handle::SafeHandle;

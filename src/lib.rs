/*!
# medcodec-native

The native codec integration core of a medical-imaging toolkit: a single
crate that gives a host application access to JPEG, JPEG-LS, JPEG 2000 and
video codecs by binding to vendored native libraries and exposing them
through a stable, priority-arbitrated registry.

The crate is organized leaves-first, the same order the native facade
depends on its own pieces:

- [`facade`] — the native C ABI surface: version/feature/SIMD queries, the
  thread-local error slot, and the per-codec wrappers (JPEG, JPEG 2000,
  JPEG-LS, video) plus the GPU dispatch shim.
- [`host`] — the safe Rust layer that calls into [`facade`] as a P/Invoke
  host would: library discovery, version handshake, and safe handles
  around native resources.
- [`codec_trait`], [`adapters`], [`registry`] — the host-side codec
  abstraction, its concrete per-codec implementations, and the
  priority-arbitrated registry mapping transfer-syntax identifiers to them.
- [`init`] — the one-shot initializer and auto-init lifecycle.

Everything above the facade is plain safe Rust; `unsafe` is confined to the
`extern "C"` entry points in [`facade`] and the pointer plumbing in
[`host::safe_handle`].
*/

pub mod adapters;
pub mod coding_parameters;
pub mod codec_trait;
pub mod constants;
pub mod error;
pub mod facade;
pub mod host;
pub mod init;
pub mod registry;
pub mod simd;

pub use codec_trait::{PixelDataCodec, RasterFrame};
pub use error::{CodecError, ErrorKind};
pub use init::{initialize, registry as codec_registry, InitError, InitOptions};
pub use registry::CodecRegistry;

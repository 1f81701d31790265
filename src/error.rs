//! Unified error taxonomy (spec.md §7) and the thread-local error slot that
//! every facade entry point writes to before returning a non-zero status.

use std::cell::UnsafeCell;
use std::ffi::CStr;
use std::fmt::Write as _;
use std::os::raw::c_char;

use thiserror::Error;

use crate::constants::ERROR_SLOT_SIZE;

/// The unified status/error taxonomy every native entry point returns,
/// `Ok` encoded as `0` and every other variant as a negative `c_int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive)]
#[repr(i32)]
pub enum ErrorKind {
    Ok = 0,
    InvalidArgument = -1,
    OutOfMemory = -2,
    DecodeFailed = -3,
    EncodeFailed = -4,
    Unsupported = -5,
    CorruptData = -6,
    Timeout = -7,
    Internal = -8,
}

impl ErrorKind {
    /// Human-readable category label, used by host adapters when raising a
    /// [`CodecError`] (spec.md §4.8).
    pub fn category(self) -> &'static str {
        match self {
            ErrorKind::Ok => "ok",
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::OutOfMemory => "out-of-memory",
            ErrorKind::DecodeFailed => "decode-failed",
            ErrorKind::EncodeFailed => "encode-failed",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::CorruptData => "corrupt-data",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
        }
    }
}

/// The host-facing error raised by a [`crate::codec_trait::PixelDataCodec`]
/// adapter after a non-zero facade return (spec.md §4.8, §7).
#[derive(Debug, Error)]
#[error("{transfer_syntax}: {kind:?} (native code {native_code}): {message}")]
pub struct CodecError {
    pub kind: ErrorKind,
    pub native_code: i32,
    pub message: String,
    pub transfer_syntax: &'static str,
}

impl CodecError {
    pub fn category(&self) -> &'static str {
        self.kind.category()
    }
}

/// Fixed-size, never-reallocated per-thread error buffer. Access is
/// synchronous and confined to the owning thread, so an `UnsafeCell` avoids
/// `RefCell`'s runtime borrow bookkeeping on what is effectively a hot path.
struct ErrorSlot(UnsafeCell<[u8; ERROR_SLOT_SIZE]>);

// SAFETY: a `thread_local!` value is only ever reachable from its owning
// thread, so no synchronization is required for the interior mutability.
unsafe impl Sync for ErrorSlot {}

thread_local! {
    static ERROR_SLOT: ErrorSlot = const { ErrorSlot(UnsafeCell::new([0u8; ERROR_SLOT_SIZE])) };
}

/// Overwrite the current thread's error slot with `message`, truncating to
/// `ERROR_SLOT_SIZE - 1` bytes plus a NUL terminator. Never allocates.
pub fn set_error(message: &str) {
    ERROR_SLOT.with(|slot| {
        // SAFETY: single-threaded access, no overlapping borrow outlives this call.
        let buf = unsafe { &mut *slot.0.get() };
        buf.fill(0);
        let max = ERROR_SLOT_SIZE - 1;
        let truncated = if message.len() > max {
            // Avoid splitting a UTF-8 code point in half.
            let mut end = max;
            while end > 0 && !message.is_char_boundary(end) {
                end -= 1;
            }
            &message[..end]
        } else {
            message
        };
        buf[..truncated.len()].copy_from_slice(truncated.as_bytes());
    });
}

/// `printf`-style formatter variant of [`set_error`], exposed to wrapper
/// translation units per spec.md §4.1. Formats directly into the thread
/// local buffer without an intermediate heap allocation.
pub fn set_error_fmt(args: std::fmt::Arguments<'_>) {
    ERROR_SLOT.with(|slot| {
        // SAFETY: single-threaded access, no overlapping borrow outlives this call.
        let buf = unsafe { &mut *slot.0.get() };
        buf.fill(0);
        let mut cursor = ErrorCursor { buf: &mut buf[..], pos: 0 };
        let _ = cursor.write_fmt(args);
    });
}

/// A bounded, non-allocating `fmt::Write` target over the error slot.
struct ErrorCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl std::fmt::Write for ErrorCursor<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let remaining = self.buf.len() - 1 - self.pos; // keep room for NUL
        let mut end = s.len().min(remaining);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        self.buf[self.pos..self.pos + end].copy_from_slice(&s.as_bytes()[..end]);
        self.pos += end;
        Ok(())
    }
}

/// Clear the current thread's error slot.
pub fn clear_error() {
    ERROR_SLOT.with(|slot| unsafe { &mut *slot.0.get() }.fill(0));
}

/// Read the current thread's error slot as a UTF-8 string (lossy only in the
/// pathological case of a truncation landing mid-sequence, which
/// [`set_error`] already avoids).
pub fn last_error() -> String {
    ERROR_SLOT.with(|slot| {
        let buf = unsafe { &*slot.0.get() };
        let cstr = CStr::from_bytes_until_nul(&buf[..]).unwrap_or(c"");
        cstr.to_string_lossy().into_owned()
    })
}

/// Raw pointer to the current thread's NUL-terminated error buffer, for the
/// `last_error() -> ptr<char>` facade entry point. The pointer is valid only
/// for the lifetime of the calling thread and must not be freed by callers.
pub fn last_error_ptr() -> *const c_char {
    ERROR_SLOT.with(|slot| slot.0.get() as *const c_char)
}

/// Record `kind`'s message into the thread-local slot and return its numeric
/// status code, the idiom every facade wrapper function ends on.
pub fn fail(kind: ErrorKind, message: impl std::fmt::Display) -> i32 {
    set_error(&message.to_string());
    i32::from(kind)
}

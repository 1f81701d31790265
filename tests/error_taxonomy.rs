//! `CodecError`/`ErrorKind` taxonomy behavior reachable from outside the
//! crate (spec.md §7).

use medcodec_native::{CodecError, ErrorKind};

#[test]
fn every_kind_round_trips_through_its_i32_encoding() {
    let kinds = [
        ErrorKind::Ok,
        ErrorKind::InvalidArgument,
        ErrorKind::OutOfMemory,
        ErrorKind::DecodeFailed,
        ErrorKind::EncodeFailed,
        ErrorKind::Unsupported,
        ErrorKind::CorruptData,
        ErrorKind::Timeout,
        ErrorKind::Internal,
    ];
    for kind in kinds {
        let code: i32 = kind.into();
        let back = ErrorKind::try_from(code).expect("every defined variant round-trips");
        assert_eq!(kind, back);
    }
}

#[test]
fn ok_is_zero_and_every_other_kind_is_negative() {
    assert_eq!(i32::from(ErrorKind::Ok), 0);
    for kind in [
        ErrorKind::InvalidArgument,
        ErrorKind::OutOfMemory,
        ErrorKind::DecodeFailed,
        ErrorKind::EncodeFailed,
        ErrorKind::Unsupported,
        ErrorKind::CorruptData,
        ErrorKind::Timeout,
        ErrorKind::Internal,
    ] {
        assert!(i32::from(kind) < 0);
    }
}

#[test]
fn unknown_status_code_fails_to_convert() {
    assert!(ErrorKind::try_from(-999).is_err());
    assert!(ErrorKind::try_from(1).is_err());
}

#[test]
fn codec_error_display_includes_transfer_syntax_and_kind() {
    let err = CodecError {
        kind: ErrorKind::DecodeFailed,
        native_code: -3,
        message: "corrupt SOF marker".to_string(),
        transfer_syntax: "1.2.840.10008.1.2.4.50",
    };
    let rendered = err.to_string();
    assert!(rendered.contains("1.2.840.10008.1.2.4.50"));
    assert!(rendered.contains("corrupt SOF marker"));
    assert_eq!(err.category(), "decode-failed");
}

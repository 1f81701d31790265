//! Integration coverage for the process-wide registry reached through
//! `medcodec_native::initialize`/`codec_registry`. `initialize` caches its
//! result for the lifetime of the process (spec.md §4.10 "once-only
//! discipline"), so this file runs a single `#[test]` function covering the
//! whole post-init surface rather than one test per assertion, to avoid
//! ordering-dependent interference between tests sharing that cache.

use medcodec_native::InitOptions;

#[test]
fn fully_enabled_init_registers_every_native_transfer_syntax() {
    let result = medcodec_native::initialize(InitOptions::with_defaults_enabled());
    assert!(result.is_ok(), "default-enabled init should pass its own version check: {result:?}");

    let registry = medcodec_native::codec_registry();
    let expected = [
        ("1.2.840.10008.1.2.4.50", "jpeg-baseline"),
        ("1.2.840.10008.1.2.4.80", "jpeg-ls-lossless"),
        ("1.2.840.10008.1.2.4.81", "jpeg-ls-near-lossless"),
        ("1.2.840.10008.1.2.4.90", "jpeg2000-lossless"),
        ("1.2.840.10008.1.2.4.91", "jpeg2000-lossy"),
    ];

    for (ts, _) in expected {
        let codec = registry.lookup(ts);
        assert!(codec.is_some(), "expected a codec registered for {ts}");
        assert_eq!(codec.unwrap().transfer_syntax(), ts);
    }

    for ts in ["1.2.840.10008.1.2.5", "not-a-transfer-syntax"] {
        assert!(registry.lookup(ts).is_none());
    }
}

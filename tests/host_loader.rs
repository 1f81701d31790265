//! Host-side library discovery, exercised as an external caller would use
//! it (spec.md §4.7): no dynamic library is guaranteed to be on the search
//! path during a test run, so these only check the failure-path contract.

use medcodec_native::host::loader;
use std::path::Path;

#[test]
fn loading_a_nonexistent_explicit_path_reports_not_found() {
    let result = loader::load(Some(Path::new("/nonexistent/path/libmedcodec_native_test.so")), false);
    assert!(result.is_err());
    match result.unwrap_err() {
        loader::LoadError::NotFound { tried } => assert!(!tried.is_empty()),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

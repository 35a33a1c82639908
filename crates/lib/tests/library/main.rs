//! Library integration tests against repositories on disk.

mod bundle_tests;
mod common;
mod manifest_tests;

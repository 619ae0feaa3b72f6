//! Test constants for nixext-extensions tests

#![allow(dead_code)]

/// Manifest version used by default fixtures
pub const TEST_VERSION: &str = "1.2.3";

/// Chromium major version passed to the store in tests
pub const TEST_CHROMIUM_VERSION: &str = "140";

/// SRI returned by the mock `nix hash to-sri`
pub const TEST_SRI: &str = "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";

/// A plausible Chrome Web Store id
pub const TEST_STORE_ID: &str = "cjpalhdlnbpafiamejdnhcphjbkeiagm";

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact fingerprints — SHA-256 over the published PNG bytes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Stored alongside every published artifact and used by the directory
/// publisher as the output file name.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(hash_bytes(b"veil"), hash_bytes(b"message"));
    }
}

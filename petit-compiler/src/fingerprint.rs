// petit-compiler/src/fingerprint.rs
// Content digest of emitted assembly

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `asm`.
pub fn digest(asm: &str) -> String {
    hex::encode(Sha256::digest(asm.as_bytes()))
}

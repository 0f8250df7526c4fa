//! Confirmation codes: issued at signup, exchanged for an access token.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const CODE_BYTES: usize = 32;

/// A plaintext confirmation code.
///
/// Only ever handed to the notifier; storage keeps the `CodeDigest`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    /// Draw a fresh code from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CODE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> CodeDigest {
        CodeDigest::of(&self.0)
    }
}

impl core::fmt::Debug for ConfirmationCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ConfirmationCode(<redacted>)")
    }
}

/// Hex-encoded SHA-256 of a confirmation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeDigest(String);

impl CodeDigest {
    pub fn of(code: &str) -> Self {
        Self(hex::encode(Sha256::digest(code.as_bytes())))
    }

    /// Rehydrate a digest read back from storage.
    pub fn from_stored(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare a candidate code against this digest.
    ///
    /// Both sides are fixed-length digests, so the comparison takes the same
    /// time whatever the candidate's length or content.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = Self::of(candidate);
        self.0.as_bytes().ct_eq(candidate.0.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_hex() {
        let a = ConfirmationCode::generate();
        let b = ConfirmationCode::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), CODE_BYTES * 2);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_matches_only_its_code() {
        let code = ConfirmationCode::generate();
        let digest = code.digest();
        assert!(digest.matches(code.as_str()));
        assert!(!digest.matches(ConfirmationCode::generate().as_str()));
        assert!(!digest.matches(""));
    }

    #[test]
    fn debug_never_prints_the_code() {
        let code = ConfirmationCode::generate();
        assert!(!format!("{code:?}").contains(code.as_str()));
    }
}

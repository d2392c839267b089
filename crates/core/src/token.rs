//! Transfer tokens and the identifier generator.
//!
//! A transfer token is the sole external reference to an upload. Tokens are
//! short, URL-safe, and contain no `/` or `.` by construction, so they are
//! safe both as a filesystem path component and as a URL query value.
//! Validation of externally supplied tokens is still mandatory at the
//! boundary: generated tokens being clean is a guarantee about *our* output,
//! not about attacker-controlled input.

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alphabet for generated tokens. URL-safe, no path separators, no dots.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of generated tokens. 64^12 values make collisions within the
/// lifetime of an ephemeral store vanishingly unlikely.
pub const TOKEN_LEN: usize = 12;

/// An opaque identifier for one upload/download pair.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferToken(String);

impl TransferToken {
    /// Generate a new random token from the OS entropy source.
    ///
    /// Fails with [`Error::TokenGeneration`](crate::Error::TokenGeneration)
    /// if the entropy source cannot produce bytes; fatal to the single
    /// upload attempt, not to the process.
    pub fn generate() -> crate::Result<Self> {
        let mut buf = [0u8; TOKEN_LEN];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| crate::Error::TokenGeneration(e.to_string()))?;

        // The alphabet has 64 entries, so masking the low 6 bits indexes it
        // uniformly.
        let token = buf
            .iter()
            .map(|b| TOKEN_ALPHABET[(b & 0x3f) as usize] as char)
            .collect();
        Ok(Self(token))
    }

    /// Validate externally supplied token text.
    ///
    /// Rejects empty tokens and anything containing path-separator or
    /// relative-reference characters, before any storage lookup happens.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidToken("empty token".to_string()));
        }
        if s.bytes().any(|b| !TOKEN_ALPHABET.contains(&b)) {
            return Err(crate::Error::InvalidToken(
                "token contains characters outside the token alphabet".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TransferToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransferToken({})", self.0)
    }
}

impl fmt::Display for TransferToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_tokens_are_path_and_url_safe() {
        for _ in 0..100 {
            let token = TransferToken::generate().unwrap();
            assert_eq!(token.as_str().len(), TOKEN_LEN);
            assert!(!token.as_str().contains('/'));
            assert!(!token.as_str().contains('.'));
            assert!(
                token
                    .as_str()
                    .bytes()
                    .all(|b| TOKEN_ALPHABET.contains(&b))
            );
        }
    }

    #[test]
    fn generated_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1000)
            .map(|_| TransferToken::generate().unwrap().as_str().to_string())
            .collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn parse_roundtrips_generated_tokens() {
        let token = TransferToken::generate().unwrap();
        let parsed = TransferToken::parse(token.as_str()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn parse_rejects_traversal_shapes() {
        for bad in ["", "../secret", "a/b", ".", "..", "a\\b", "a.txt", " "] {
            assert!(
                TransferToken::parse(bad).is_err(),
                "expected rejection: {bad:?}"
            );
        }
    }
}

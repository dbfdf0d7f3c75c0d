//! Public key generation for webhooks.

use rand::Rng;
use thiserror::Error;

/// Prefix of every webhook public key.
pub const PREFIX: &str = "WH";

/// Length of a freshly generated key, prefix included.
pub const INITIAL_LENGTH: usize = 13;

/// Attempts made before giving up; each retry lengthens the key by one.
pub const MAX_ATTEMPTS: usize = 5;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Error type for key generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyGenerationError {
    /// Every candidate collided with an existing key.
    #[error("Could not generate a unique public key with prefix '{prefix}' after {attempts} attempts")]
    Exhausted {
        /// Key prefix
        prefix: String,
        /// Attempts made
        attempts: usize,
    },
}

/// Generates a random key of `length` characters starting with `prefix`.
///
/// If `length` does not exceed the prefix length, the prefix is returned as is.
#[must_use]
pub fn random_key(prefix: &str, length: usize) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..length.saturating_sub(prefix.len()))
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("{prefix}{suffix}")
}

/// Generates a webhook public key not reported by `exists`.
///
/// Candidates start at [`INITIAL_LENGTH`] characters and grow by one on each
/// collision.
///
/// # Errors
///
/// Returns [`KeyGenerationError::Exhausted`] after [`MAX_ATTEMPTS`] collisions.
pub fn generate_public_key(exists: impl Fn(&str) -> bool) -> Result<String, KeyGenerationError> {
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = random_key(PREFIX, INITIAL_LENGTH + attempt);
        if !exists(&candidate) {
            return Ok(candidate);
        }
        tracing::debug!("Public key collision on attempt {}: {candidate}", attempt + 1);
    }

    Err(KeyGenerationError::Exhausted {
        prefix: PREFIX.to_string(),
        attempts: MAX_ATTEMPTS,
    })
}

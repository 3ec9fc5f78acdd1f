//! Opaque session token generation.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of every issued token, in characters.
pub const TOKEN_LENGTH: usize = 32;

/// Source of fresh session tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produce a new opaque token.
    fn generate(&self) -> String;
}

/// Draws [`TOKEN_LENGTH`] characters uniformly from `[A-Za-z0-9]` using the
/// thread-local CSPRNG.
///
/// Collisions are not checked against existing tokens; at ~190 bits of
/// entropy they are treated as impossible.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        generate_token()
    }
}

/// Generate a random alphanumeric session token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

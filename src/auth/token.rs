use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

pub const TOKEN_LEN: usize = 48;

/// Generate a plaintext bearer token. It is returned to the client exactly
/// once; only its hash goes into the database.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Lookup key stored for a token. Comparing hashes through the unique
/// index keeps the plaintext out of the store and the comparison out of
/// application code.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

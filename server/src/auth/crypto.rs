use sha2::{Digest, Sha256};

/// Tokens are only ever compared by their SHA-256 digest.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

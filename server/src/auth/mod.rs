mod crypto;
mod extractor;

use crypto::hash_token;
pub use extractor::AuthUser;

use std::collections::HashMap;

use async_trait::async_trait;
use ladle_core::OwnerId;

/// Resolves a bearer token to the owner it belongs to.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Option<OwnerId>;
}

/// Static token table loaded from configuration.
#[derive(Debug, Default)]
pub struct TokenAuthenticator {
    owners_by_hash: HashMap<String, OwnerId>,
}

impl TokenAuthenticator {
    pub fn new(tokens: impl IntoIterator<Item = (OwnerId, String)>) -> Self {
        Self {
            owners_by_hash: tokens
                .into_iter()
                .map(|(owner_id, token)| (hash_token(&token), owner_id))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owners_by_hash.is_empty()
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Option<OwnerId> {
        self.owners_by_hash.get(&hash_token(token)).copied()
    }
}

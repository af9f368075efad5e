//! Shared fixtures for unit tests.

use std::sync::Arc;

use axum::Router;
use ladle_core::{
    ContentFetcher, FakeProvider, HtmlNormalizer, LlmProvider, MockFetcher, RecipeCandidate,
    RecipeExtractor,
};
use tempfile::TempDir;

use crate::auth::TokenAuthenticator;
use crate::db::{create_pool, DbPool};
use crate::scraping::Pipeline;
use crate::service::RecipeService;
use crate::store::RecipeStore;
use crate::{api, App};

pub const SOUP_URL: &str = "http://x.test/r1";

pub const SOUP_HTML: &str = r#"<html>
<head><title>Recipe: Soup</title></head>
<body>
  <h1>Soup</h1>
  <ul><li>water</li><li>salt</li></ul>
  <p>Boil the water with the salt.</p>
</body>
</html>"#;

pub const SOUP_JSON: &str =
    r#"{"name":"Soup","ingredients":["water","salt"],"instructions":["boil"],"image_url":null}"#;

pub const OWNER_1_TOKEN: &str = "token-for-owner-1";
pub const OWNER_2_TOKEN: &str = "token-for-owner-2";

/// A migrated database in a temp directory. Keep the `TempDir` alive for the test.
pub fn test_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ladle-test.db");
    let pool = create_pool(path.to_str().unwrap(), 4).unwrap();
    (dir, pool)
}

pub fn test_store() -> (TempDir, RecipeStore) {
    let (dir, pool) = test_pool();
    (dir, RecipeStore::new(pool))
}

pub fn candidate(name: &str) -> RecipeCandidate {
    RecipeCandidate {
        name: name.to_string(),
        ingredients: vec!["water".to_string(), "salt".to_string()],
        instructions: vec!["boil".to_string()],
        image_url: None,
    }
}

pub struct Harness {
    pub _dir: TempDir,
    pub store: RecipeStore,
    pub fetcher: Arc<MockFetcher>,
    pub provider: Arc<FakeProvider>,
    pub pipeline: Arc<Pipeline>,
}

pub fn harness(fetcher: MockFetcher, provider: FakeProvider) -> Harness {
    let (dir, store) = test_store();
    let fetcher = Arc::new(fetcher);
    let provider = Arc::new(provider);
    let pipeline = Pipeline::new(
        store.clone(),
        fetcher.clone() as Arc<dyn ContentFetcher>,
        Arc::new(HtmlNormalizer::new()),
        Arc::new(RecipeExtractor::new(provider.clone() as Arc<dyn LlmProvider>)),
    );
    Harness {
        _dir: dir,
        store,
        fetcher,
        provider,
        pipeline: Arc::new(pipeline),
    }
}

/// The full router over `h`, accepting `OWNER_1_TOKEN` and `OWNER_2_TOKEN`.
pub fn test_app(h: &Harness) -> Router {
    let recipes = RecipeService::new(h.pipeline.clone(), h.store.clone());
    let authenticator = TokenAuthenticator::new([
        (1, OWNER_1_TOKEN.to_string()),
        (2, OWNER_2_TOKEN.to_string()),
    ]);
    api::router(Arc::new(App {
        recipes,
        authenticator: Arc::new(authenticator),
    }))
}

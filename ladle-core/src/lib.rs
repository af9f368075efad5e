pub mod error;
pub mod extract;
pub mod http;
pub mod llm;
pub mod normalize;
pub mod prompts;
pub mod types;

pub use error::{ExtractError, FetchError};
pub use extract::{parse_candidate, RecipeExtractor, DEFAULT_MAX_ATTEMPTS};
pub use http::{
    parse_http_url, ContentFetcher, HttpFetcher, HttpFetcherBuilder, MockFetcher,
    MockResponse,
};
pub use llm::{
    create_provider, CompletionRequest, ConfigError, FakeProvider, LlmConfig, LlmError,
    LlmProvider, ProviderKind,
};
pub use normalize::{ContentNormalizer, HtmlNormalizer};
pub use types::{OwnerId, Recipe, RecipeCandidate, RecipeId, RecipeUpdate};

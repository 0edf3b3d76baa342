//! Repositories: caller-side access to endpoints through any [`ApiContract`]

use async_trait::async_trait;

use crate::endpoints::{PokemonListRequest, PokemonListResponse};
use crate::error::ApiResult;
use crate::executor::ApiContract;

#[async_trait]
pub trait PokemonListRepositoryContract: Send + Sync {
    async fn fetch(&self) -> ApiResult<PokemonListResponse>;

    async fn fetch_page(&self, request: PokemonListRequest) -> ApiResult<PokemonListResponse>;
}

/// Fetches the Pokémon listing
pub struct PokemonListRepository<A> {
    api: A,
}

impl<A: ApiContract> PokemonListRepository<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Cancel the listing request currently in flight
    pub fn cancel(&self) {
        self.api.cancel();
    }
}

#[async_trait]
impl<A: ApiContract> PokemonListRepositoryContract for PokemonListRepository<A> {
    async fn fetch(&self) -> ApiResult<PokemonListResponse> {
        self.api.call(PokemonListRequest::default()).await
    }

    async fn fetch_page(&self, request: PokemonListRequest) -> ApiResult<PokemonListResponse> {
        self.api.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::JsonDecoder;
    use crate::error::ApiError;
    use crate::executor::RequestExecutor;
    use crate::reachability::{AlwaysReachable, ReachabilityFlag};
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    const LISTING: &str = r#"{"items":[{"id":1,"name":"bulbasaur"}]}"#;

    #[tokio::test]
    async fn test_fetch_delegates_to_executor() {
        let transport = ScriptedTransport::replying(200, LISTING);
        let repository = PokemonListRepository::new(RequestExecutor::new(
            transport.clone(),
            AlwaysReachable,
            JsonDecoder,
        ));

        let list = repository.fetch().await.unwrap().into_value().unwrap();

        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].name, "bulbasaur");
        assert_eq!(transport.issued()[0].parameters.get("offset"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_fetch_page_passes_paging() {
        let transport = ScriptedTransport::replying(200, LISTING);
        let repository = PokemonListRepository::new(RequestExecutor::new(
            transport.clone(),
            AlwaysReachable,
            JsonDecoder,
        ));

        repository
            .fetch_page(PokemonListRequest::page(10, 30))
            .await
            .unwrap();

        let issued = transport.issued();
        assert_eq!(issued[0].parameters.get("limit"), Some(&json!(10)));
        assert_eq!(issued[0].parameters.get("offset"), Some(&json!(30)));
    }

    #[tokio::test]
    async fn test_fetch_offline() {
        let repository = PokemonListRepository::new(RequestExecutor::new(
            ScriptedTransport::new(),
            ReachabilityFlag::new(false),
            JsonDecoder,
        ));

        let result = repository.fetch().await;
        assert!(matches!(result, Err(ApiError::ConnectionUnavailable)));
    }
}

//! Pokémon listing endpoint

use apistore_interface::{Endpoint, Headers, Method, Parameters, ResponseBody};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Path of the listing endpoint, relative to the configured base URL
pub const POKEMON_LIST_PATH: &str = "pokemon";

/// One page of the Pokémon listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PokemonListRequest {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PokemonListRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl PokemonListRequest {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// The request for the page after this one
    pub fn next_page(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

impl Endpoint for PokemonListRequest {
    type Response = PokemonListResponse;

    fn url(&self) -> String {
        POKEMON_LIST_PATH.to_string()
    }

    fn method(&self) -> Method {
        Method::Get
    }

    fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("limit".to_string(), json!(self.limit));
        params.insert("offset".to_string(), json!(self.offset));
        params
    }

    fn headers(&self) -> Headers {
        Headers::from([("Accept".to_string(), "application/json".to_string())])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonListResponse {
    pub items: Vec<PokemonSummary>,
}

impl ResponseBody for PokemonListResponse {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PokemonSummary {
    pub id: u32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use apistore_interface::{ParameterEncoding, TransportRequest};

    #[test]
    fn test_request_shape() {
        let request = TransportRequest::from_endpoint(&PokemonListRequest::page(50, 100));

        assert_eq!(request.url, "pokemon");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.encoding, ParameterEncoding::Url);
        assert_eq!(request.parameters.get("limit"), Some(&json!(50)));
        assert_eq!(request.parameters.get("offset"), Some(&json!(100)));
    }

    #[test]
    fn test_next_page() {
        let first = PokemonListRequest::default();
        let second = first.next_page();
        assert_eq!(second, PokemonListRequest::page(20, 20));
        assert_eq!(second.next_page().offset, 40);
    }

    #[test]
    fn test_response_parses_listing() {
        let body = r#"{"items":[{"id":1,"name":"bulbasaur"}]}"#;
        let response: PokemonListResponse = serde_json::from_str(body).unwrap();

        assert_eq!(
            response.items,
            vec![PokemonSummary {
                id: 1,
                name: "bulbasaur".to_string()
            }]
        );
    }
}

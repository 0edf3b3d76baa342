//! Endpoint descriptors served by the executor

pub mod pokemon;

pub use pokemon::{PokemonListRequest, PokemonListResponse, PokemonSummary};

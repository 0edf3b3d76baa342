/*!
 * apistore - typed, cancellable request/response execution
 *
 * A thin execution layer between application code and the network:
 * - Connectivity gate checked before anything is dispatched
 * - Pluggable transport (reqwest-backed HTTP by default)
 * - Typed decoding of response payloads, with an explicit no-content outcome
 * - Exactly one outcome per call, even when cancel races completion
 *
 * Version: 0.3.0
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod bridge;
pub mod config;
pub mod decoder;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod logging;
pub mod outcome;
pub mod reachability;
pub mod repository;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export commonly used types
pub use config::{ApiConfig, ExecutorConfig, LogConfig, LogLevel, StatusRange};
pub use decoder::JsonDecoder;
pub use error::{ApiError, ApiResult, ConfigError};
pub use executor::{ApiContract, RequestExecutor};
pub use logging::init_logging;
pub use outcome::Outcome;
pub use reachability::{AlwaysReachable, FnGate, ReachabilityFlag};
pub use repository::{PokemonListRepository, PokemonListRepositoryContract};

pub use apistore_http::{HttpConfig, HttpHandle, HttpSetupError, HttpTransport};
pub use apistore_interface::{
    CancelHandle, Completion, ConnectivityGate, DecodeError, Decoder, Endpoint, Headers, Method,
    NoContent, ParameterEncoding, Parameters, RawResponse, ResponseBody, Transport, TransportError,
    TransportRequest,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Apistore HTTP: reqwest-backed transport for the request executor
//!
//! This crate provides the concrete network side of the executor:
//!
//! - **HttpTransport**: implements `Transport` by spawning one tokio task per call
//! - **HttpHandle**: cancels a call by aborting its task
//! - **HttpConfig**: client timeouts, user agent, base URL and default headers
//!
//! # Example
//!
//! ```rust,no_run
//! use apistore_http::{HttpConfig, HttpTransport};
//! use apistore_interface::{Method, Parameters, ParameterEncoding, Transport, TransportRequest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = HttpConfig {
//!     base_url: Some("https://pokeapi.co/api/v2/".to_string()),
//!     ..Default::default()
//! };
//! let transport = HttpTransport::new(&config)?;
//!
//! let request = TransportRequest {
//!     url: "pokemon".to_string(),
//!     method: Method::Get,
//!     parameters: Parameters::new(),
//!     headers: Default::default(),
//!     encoding: ParameterEncoding::Url,
//! };
//!
//! let _handle = transport.issue(
//!     request,
//!     Box::new(|result| match result {
//!         Ok(response) => println!("status {}", response.status),
//!         Err(e) => eprintln!("request failed: {}", e),
//!     }),
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod transport;

pub use config::HttpConfig;
pub use error::HttpSetupError;
pub use transport::{HttpHandle, HttpTransport};

//! RequestExecutor: gate, dispatch, decode and cancel typed endpoint calls
//!
//! # Call lifecycle
//!
//! ```text
//! call(endpoint)
//!   │
//!   ├─ gate unreachable ──────────────────────────► Err(ConnectionUnavailable)
//!   │
//!   ▼
//! Transport::issue ──► handle stored in the in-flight slot (replaces any earlier call's handle)
//!   │
//!   ▼ completion (any thread)             cancel() (any thread)
//!   ├─ status outside accepted range ─► Err(Transport(UnacceptableStatus))
//!   ├─ no-content status + NoContent type ─► Ok(NoContent)
//!   ├─ decode ok / failed ─► Ok(Success) / Err(Decoding)
//!   ├─ transport error ─► Err(Transport)
//!   │                                     └─► Err(Cancelled), handle aborted
//!   ▼
//! first resolution wins, slot cleared if it still holds this call
//! ```
//!
//! # Limitation
//!
//! Only the most recently dispatched call is cancellable. Dispatching a second call
//! before the first resolves replaces the stored handle without cancelling the first;
//! the first call still runs to completion (or to the transport's timeout) on its own.

use apistore_http::HttpTransport;
use apistore_interface::{
    CancelHandle, Completion, ConnectivityGate, Decoder, Endpoint, RawResponse, ResponseBody,
    Transport, TransportError, TransportRequest,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

use crate::bridge;
use crate::config::{ApiConfig, ExecutorConfig};
use crate::decoder::JsonDecoder;
use crate::error::{ApiError, ApiResult, ConfigError};
use crate::outcome::Outcome;

/// Caller-facing contract of the executor
///
/// Repositories depend on this trait rather than on a concrete executor.
#[async_trait]
pub trait ApiContract: Send + Sync {
    /// Execute `endpoint` and wait for its single outcome
    async fn call<E: Endpoint>(&self, endpoint: E) -> ApiResult<E::Response>;

    /// Cancel the most recently dispatched call, if it is still in flight
    fn cancel(&self);
}

#[async_trait]
impl<A: ApiContract> ApiContract for Arc<A> {
    async fn call<E: Endpoint>(&self, endpoint: E) -> ApiResult<E::Response> {
        (**self).call(endpoint).await
    }

    fn cancel(&self) {
        (**self).cancel()
    }
}

type Abort = Box<dyn FnOnce() -> bool + Send>;

/// The handle of the most recently dispatched call
struct InFlight<H> {
    call_id: u64,
    handle: H,
    /// Resolves the call's bridge with `Cancelled`; `false` if it already resolved
    abort: Abort,
}

enum Stored {
    /// Entry is now current; carries the id of the call it displaced
    Replaced(Option<u64>),
    /// A later call already holds the slot; the entry was dropped
    Superseded(u64),
}

/// Single mutex-guarded slot holding at most one in-flight call
struct InFlightSlot<H> {
    current: Mutex<Option<InFlight<H>>>,
}

impl<H: CancelHandle> InFlightSlot<H> {
    fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<InFlight<H>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `entry` unless the slot already holds a later call
    ///
    /// Call ids grow with dispatch order, so an `issue` that returns late cannot
    /// displace the handle of a call dispatched after it.
    fn store(&self, entry: InFlight<H>) -> Stored {
        let call_id = entry.call_id;
        let displaced = {
            let mut current = self.lock();
            let later = current
                .as_ref()
                .map(|existing| existing.call_id)
                .filter(|&existing| existing > call_id);
            if let Some(later) = later {
                return Stored::Superseded(later);
            }
            current.replace(entry)
        };
        // Dropped outside the lock; dropping a handle leaves its call running
        Stored::Replaced(displaced.map(|previous| previous.call_id))
    }

    /// Clear the slot only if it still belongs to `call_id`
    fn clear_if(&self, call_id: u64) -> bool {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|entry| entry.call_id == call_id) {
            current.take();
            true
        } else {
            false
        }
    }

    fn take(&self) -> Option<InFlight<H>> {
        self.lock().take()
    }

    fn current_call(&self) -> Option<u64> {
        self.lock().as_ref().map(|entry| entry.call_id)
    }
}

/// Executes typed endpoint calls through injected collaborators
///
/// # Example
///
/// ```rust,no_run
/// use apistore::{ApiConfig, Outcome, ReachabilityFlag, RequestExecutor};
/// use apistore::endpoints::PokemonListRequest;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = ApiConfig::from_file("apistore.toml")?;
/// let reachability = ReachabilityFlag::new(true);
/// let executor = RequestExecutor::from_config(&config, reachability.clone())?;
///
/// if let Outcome::Success(list) = executor.call(PokemonListRequest::default()).await? {
///     for pokemon in list.items {
///         println!("#{} {}", pokemon.id, pokemon.name);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct RequestExecutor<T: Transport, G, D> {
    transport: T,
    gate: G,
    decoder: Arc<D>,
    config: ExecutorConfig,
    in_flight: Arc<InFlightSlot<T::Handle>>,
    next_call_id: AtomicU64,
}

impl<T, G, D> RequestExecutor<T, G, D>
where
    T: Transport,
    G: ConnectivityGate,
    D: Decoder,
{
    /// Create an executor with the default status policy (accept 2xx, 204 = no content)
    pub fn new(transport: T, gate: G, decoder: D) -> Self {
        Self::with_config(transport, gate, decoder, ExecutorConfig::default())
    }

    pub fn with_config(transport: T, gate: G, decoder: D, config: ExecutorConfig) -> Self {
        Self {
            transport,
            gate,
            decoder: Arc::new(decoder),
            config,
            in_flight: Arc::new(InFlightSlot::new()),
            next_call_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Id of the call currently held in the cancellable slot
    pub fn current_call_id(&self) -> Option<u64> {
        self.in_flight.current_call()
    }

    /// Execute `endpoint` and wait for its single outcome
    ///
    /// Resolves exactly once, from whichever of completion or [`cancel`](Self::cancel)
    /// gets there first. Dropping the returned future does not cancel the transport call.
    pub async fn call<E: Endpoint>(&self, endpoint: E) -> ApiResult<E::Response> {
        if !self.gate.is_reachable() {
            debug!("Network unreachable, not dispatching {}", endpoint.url());
            return Err(ApiError::ConnectionUnavailable);
        }

        let request = TransportRequest::from_endpoint(&endpoint);
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let (resolver, pending) = bridge::channel::<ApiResult<E::Response>>();

        let on_complete: Completion = {
            let resolver = resolver.clone();
            let decoder = Arc::clone(&self.decoder);
            let config = self.config;
            let slot = Arc::clone(&self.in_flight);
            Box::new(move |result| {
                resolver.resolve(classify::<E::Response, D>(decoder.as_ref(), &config, result));
                slot.clear_if(call_id);
            })
        };

        debug!(
            call_id,
            method = %request.method,
            url = %request.url,
            "Dispatching request"
        );
        let handle = self.transport.issue(request, on_complete);

        // A completion fired inside `issue` leaves nothing to cancel
        if !resolver.is_resolved() {
            let abort: Abort = {
                let resolver = resolver.downgrade();
                Box::new(move || resolver.resolve(Err(ApiError::Cancelled)))
            };
            match self.in_flight.store(InFlight {
                call_id,
                handle,
                abort,
            }) {
                Stored::Replaced(Some(previous)) => debug!(
                    call_id,
                    previous, "Replaced in-flight handle; call {} is no longer cancellable", previous
                ),
                Stored::Replaced(None) => {}
                Stored::Superseded(later) => debug!(
                    call_id,
                    later, "Call {} was dispatched later; keeping its handle", later
                ),
            }

            // The completion may have fired between the check and the store
            if resolver.is_resolved() {
                self.in_flight.clear_if(call_id);
            }
        }
        // Only the completion keeps the bridge alive from here on
        drop(resolver);

        let outcome = pending
            .await
            .unwrap_or_else(|_| Err(ApiError::Transport(TransportError::CompletionDropped)));
        self.in_flight.clear_if(call_id);
        outcome
    }

    /// Cancel the most recently dispatched call, if it is still in flight
    ///
    /// The pending call resolves with [`ApiError::Cancelled`] unless its completion
    /// already resolved it. Safe to call at any time; a no-op when nothing is in flight.
    pub fn cancel(&self) {
        match self.in_flight.take() {
            Some(entry) => {
                let won = (entry.abort)();
                debug!(
                    call_id = entry.call_id,
                    won, "Cancelling in-flight request"
                );
                entry.handle.cancel();
            }
            None => trace!("cancel() with no request in flight"),
        }
    }
}

impl<G: ConnectivityGate> RequestExecutor<HttpTransport, G, JsonDecoder> {
    /// Build the default HTTP/JSON executor from `config`
    ///
    /// Must be called from within a Tokio runtime; calls are spawned onto it.
    pub fn from_config(config: &ApiConfig, gate: G) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.http)?;
        debug!(
            base_url = ?transport.base_url().map(|url| url.as_str()),
            "Created HTTP executor"
        );
        Ok(Self::with_config(
            transport,
            gate,
            JsonDecoder,
            config.executor,
        ))
    }
}

#[async_trait]
impl<T, G, D> ApiContract for RequestExecutor<T, G, D>
where
    T: Transport,
    G: ConnectivityGate,
    D: Decoder,
{
    async fn call<E: Endpoint>(&self, endpoint: E) -> ApiResult<E::Response> {
        RequestExecutor::call(self, endpoint).await
    }

    fn cancel(&self) {
        RequestExecutor::cancel(self)
    }
}

/// Turn a transport result into the call's outcome
///
/// The no-content check returns early, so the decoder never runs for it.
fn classify<R: ResponseBody, D: Decoder>(
    decoder: &D,
    config: &ExecutorConfig,
    result: Result<RawResponse, TransportError>,
) -> ApiResult<R> {
    let response = result?;

    if !config.accepted_status.contains(response.status) {
        return Err(ApiError::Transport(TransportError::UnacceptableStatus {
            status: response.status,
            body: response.body,
        }));
    }

    if response.status == config.no_content_status && R::ACCEPTS_NO_CONTENT {
        return Ok(Outcome::NoContent);
    }

    let value = decoder.decode::<R>(&response.body)?;
    Ok(Outcome::Success(value))
}

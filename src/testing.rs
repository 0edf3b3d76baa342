//! Test doubles for the executor's collaborators
//!
//! Available with the `test-util` feature.
//!
//! - [`ScriptedTransport`] records issued requests and either replies immediately or
//!   holds completions until the test fires them
//! - [`CountingDecoder`] decodes JSON and counts how often it was asked to
//!
//! ## Example
//!
//! ```
//! use apistore::testing::ScriptedTransport;
//! use apistore::{AlwaysReachable, JsonDecoder, Outcome, RequestExecutor};
//! use apistore::endpoints::PokemonListRequest;
//!
//! # tokio_test::block_on(async {
//! let transport = ScriptedTransport::replying(200, r#"{"items":[{"id":1,"name":"bulbasaur"}]}"#);
//! let executor = RequestExecutor::new(transport.clone(), AlwaysReachable, JsonDecoder);
//!
//! let list = executor.call(PokemonListRequest::default()).await.unwrap();
//! assert_eq!(list.value().map(|l| l.items.len()), Some(1));
//! assert_eq!(transport.issue_count(), 1);
//! # });
//! ```

use apistore_interface::{
    CancelHandle, Completion, DecodeError, Decoder, RawResponse, Transport, TransportError,
    TransportRequest,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::decoder::JsonDecoder;

#[derive(Clone)]
enum Mode {
    /// Complete inside `issue` with a fixed response
    Reply { status: u16, body: Bytes },
    /// Hold the completion until the test fires it
    Deferred,
}

struct IssuedCall {
    request: TransportRequest,
    completion: Option<Completion>,
    cancelled: bool,
}

struct ScriptState {
    calls: Vec<IssuedCall>,
    cancels: usize,
}

/// Transport double with scripted completions
///
/// Calls are indexed in issue order starting at 0. Clones share state.
#[derive(Clone)]
pub struct ScriptedTransport {
    mode: Mode,
    state: Arc<Mutex<ScriptState>>,
    issued: Arc<watch::Sender<usize>>,
}

impl ScriptedTransport {
    /// Hold every completion until [`complete`](Self::complete) is called
    pub fn new() -> Self {
        Self::with_mode(Mode::Deferred)
    }

    /// Complete every call synchronously with `status` and `body`
    pub fn replying(status: u16, body: impl Into<Bytes>) -> Self {
        Self::with_mode(Mode::Reply {
            status,
            body: body.into(),
        })
    }

    fn with_mode(mode: Mode) -> Self {
        let (issued, _) = watch::channel(0);
        Self {
            mode,
            state: Arc::new(Mutex::new(ScriptState {
                calls: Vec::new(),
                cancels: 0,
            })),
            issued: Arc::new(issued),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn issue_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn issued(&self) -> Vec<TransportRequest> {
        self.state()
            .calls
            .iter()
            .map(|call| call.request.clone())
            .collect()
    }

    /// Number of `cancel()` calls received across all handles
    pub fn cancel_count(&self) -> usize {
        self.state().cancels
    }

    pub fn was_cancelled(&self, index: usize) -> bool {
        self.state()
            .calls
            .get(index)
            .is_some_and(|call| call.cancelled)
    }

    /// Wait until at least `count` calls have been issued
    pub async fn wait_for_issued(&self, count: usize) {
        let mut receiver = self.issued.subscribe();
        let _ = receiver.wait_for(|issued| *issued >= count).await;
    }

    /// Fire the completion of call `index`
    ///
    /// Returns `false` if the call does not exist, already completed, or was cancelled.
    pub fn complete(&self, index: usize, result: Result<RawResponse, TransportError>) -> bool {
        // Run the completion outside the lock; it may call back into the executor
        let completion = self
            .state()
            .calls
            .get_mut(index)
            .and_then(|call| call.completion.take());
        match completion {
            Some(completion) => {
                completion(result);
                true
            }
            None => false,
        }
    }

    /// Drop the completion of call `index` without invoking it
    pub fn drop_completion(&self, index: usize) -> bool {
        let completion = self
            .state()
            .calls
            .get_mut(index)
            .and_then(|call| call.completion.take());
        completion.is_some()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ScriptedTransport {
    type Handle = ScriptedHandle;

    fn issue(&self, request: TransportRequest, on_complete: Completion) -> ScriptedHandle {
        let index = {
            let mut state = self.state();
            state.calls.push(IssuedCall {
                request,
                completion: None,
                cancelled: false,
            });
            state.calls.len() - 1
        };

        match &self.mode {
            Mode::Reply { status, body } => on_complete(Ok(RawResponse::new(*status, body.clone()))),
            Mode::Deferred => self.state().calls[index].completion = Some(on_complete),
        }
        self.issued.send_modify(|issued| *issued += 1);

        ScriptedHandle {
            index,
            state: Arc::clone(&self.state),
        }
    }
}

/// Handle returned by [`ScriptedTransport`]
///
/// Cancelling drops the call's held completion, the way an aborted task would.
pub struct ScriptedHandle {
    index: usize,
    state: Arc<Mutex<ScriptState>>,
}

impl CancelHandle for ScriptedHandle {
    fn cancel(&self) {
        let completion = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.cancels += 1;
            let call = &mut state.calls[self.index];
            if call.completion.is_some() {
                call.cancelled = true;
            }
            call.completion.take()
        };
        drop(completion);
    }
}

/// JSON decoder that counts invocations
#[derive(Clone, Default)]
pub struct CountingDecoder {
    calls: Arc<AtomicUsize>,
}

impl CountingDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for CountingDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        JsonDecoder.decode(bytes)
    }
}

//! The completion service: engine operations behind a message boundary.
//!
//! [`CompletionService::handle`] turns one [`Request`] into one
//! [`Response`] and never fails; every problem becomes a tagged error
//! result. [`CompletionService::spawn`] moves the service onto its own task
//! and returns a [`ServiceClient`] that numbers requests and matches the
//! answers back to their callers. Requests run concurrently.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::{
    CompletionEngine,
    error::ServiceError,
    protocol::{Operation, Request, Response},
};

const CHANNEL_CAPACITY: usize = 64;

/// Stateless dispatcher from requests to engine operations.
#[derive(Clone)]
pub struct CompletionService {
    engine: Arc<CompletionEngine>,
}

impl CompletionService {
    pub fn new(engine: Arc<CompletionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<CompletionEngine> {
        &self.engine
    }

    /// Answer `request`.
    pub async fn handle(&self, request: Request) -> Response {
        let id = request.id;
        debug!(id, operation = request.operation.as_str(); "Handling request");

        let result = match Operation::from_request(&request) {
            Ok(operation) => {
                debug!(id, operation = operation.name(); "Dispatching");
                self.dispatch(operation).await
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(value) => Response::success(id, value),
            Err(err) => {
                warn!(
                    id,
                    code = err.code.as_str(),
                    message = err.message.as_str();
                    "Request failed"
                );
                Response::failure(id, err)
            }
        }
    }

    async fn dispatch(&self, operation: Operation) -> Result<Value, ServiceError> {
        let engine = &self.engine;
        match operation {
            Operation::Suggestions(params) => to_value(
                engine
                    .suggestions_at(
                        params.document.document(),
                        params.range,
                        params.filter.as_ref(),
                    )
                    .await?,
            ),
            Operation::Arguments(params) => to_value(
                engine
                    .arguments_for(params.document.document(), &params.name, params.range)
                    .await?,
            ),
            Operation::Callable(params) => {
                let found = engine
                    .callable_named(params.document.document(), &params.name)
                    .await?;
                to_value(found.map(|found| found.info()))
            }
            Operation::StdlibPaths(params) => {
                to_value(engine.stdlib_paths_matching(&params.prefix).await?)
            }
            Operation::StdlibCompletions(params) => {
                to_value(engine.stdlib_completions(&params.prefix, params.range).await?)
            }
        }
    }

    /// Run the service on a background task.
    ///
    /// Must be called from within a tokio runtime. The task stops once every
    /// clone of the returned client is dropped.
    pub fn spawn(self) -> ServiceClient {
        let (request_tx, mut request_rx) = mpsc::channel::<Request>(CHANNEL_CAPACITY);
        let (response_tx, mut response_rx) = mpsc::channel::<Response>(CHANNEL_CAPACITY);
        let pending: Pending = Arc::default();

        tokio::spawn(async move {
            info!("Completion service started");
            while let Some(request) = request_rx.recv().await {
                let service = self.clone();
                let responses = response_tx.clone();
                tokio::spawn(async move {
                    let response = service.handle(request).await;
                    if responses.send(response).await.is_err() {
                        debug!("Response dropped, client is gone");
                    }
                });
            }
            info!("Completion service stopped");
        });

        let router_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(response) = response_rx.recv().await {
                let waiter = lock(&router_pending).remove(&response.id);
                match waiter {
                    Some(waiter) => {
                        // The caller may have stopped waiting.
                        let _ = waiter.send(response);
                    }
                    None => warn!(id = response.id; "Response for unknown request"),
                }
            }
        });

        ServiceClient {
            next_id: Arc::new(AtomicU64::new(1)),
            requests: request_tx,
            pending,
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|err| ServiceError::internal(err.to_string()))
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

fn lock(
    pending: &Mutex<HashMap<u64, oneshot::Sender<Response>>>,
) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Response>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for sending requests to a spawned [`CompletionService`].
#[derive(Clone)]
pub struct ServiceClient {
    next_id: Arc<AtomicU64>,
    requests: mpsc::Sender<Request>,
    pending: Pending,
}

impl ServiceClient {
    /// Send `operation` with `params` and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns the tagged error of the operation, or an `internal` error if
    /// the service has stopped.
    pub async fn request(
        &self,
        operation: &str,
        params: Value,
    ) -> Result<Value, ServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (waiter, answer) = oneshot::channel();
        lock(&self.pending).insert(id, waiter);

        if self
            .requests
            .send(Request::new(id, operation, params))
            .await
            .is_err()
        {
            lock(&self.pending).remove(&id);
            return Err(ServiceError::internal("completion service stopped"));
        }

        match answer.await {
            Ok(response) => response.into_result(),
            Err(_) => Err(ServiceError::internal("completion service dropped the request")),
        }
    }

    /// Number of requests still waiting for an answer.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

//! The endpoint: handler registration, the dispatch loop, and the client
//! handle for server-originated traffic.
//!
//! One dispatch task reads the transport and is the sole caller into
//! handlers, so inbound messages reach handlers in wire order and the
//! initialization gate needs no synchronization. Handlers are awaited inline
//! and must return quickly — anything slow moves its [`ReplyOnce`] into a
//! spawned task and returns.

use serde::Deserialize;
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};
use turbolsp_protocol::{
    ErrorCode, Message, Notification, OffsetEncoding, Request, RequestId, Response, ResponseError,
    methods,
};
use turbolsp_transport::{MessageStream, Transport, TransportResult};

use crate::cancel::CancelRegistry;
use crate::config::EndpointConfig;
use crate::context::RequestContext;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerRegistry, RegisteredHandler};
use crate::outbound::OutboundRegistry;
use crate::reply::ReplyOnce;
use crate::writer::{MessageWriter, write_loop};

/// What `serve` observed before the session ended.
///
/// The endpoint only reports whether a `shutdown` call was dispatched; the
/// process-level exit-code policy (e.g. non-zero on `exit` without
/// `shutdown`) belongs to the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// True if a `shutdown` call reached its handler before the loop stopped.
    pub shutdown_requested: bool,
}

/// Clonable handle for server-originated traffic.
///
/// Usable from any task, before and during `serve`. Calls are tracked by the
/// bounded outbound registry; notifications are fire-and-forget.
#[derive(Clone)]
pub struct Client {
    writer: MessageWriter,
    outbound: Arc<OutboundRegistry>,
}

impl Client {
    /// Send a notification to the client.
    pub fn notify(&self, method: impl Into<String>, params: Option<Value>) {
        self.writer.notify(method, params);
    }

    /// Send a call to the client; the continuation receives the reply, or an
    /// error if the call is evicted or the endpoint shuts down first.
    ///
    /// Returns the integer id the call was issued under.
    pub fn call<F>(&self, method: impl Into<String>, params: Option<Value>, continuation: F) -> i64
    where
        F: FnOnce(Result<Value, ResponseError>) + Send + 'static,
    {
        let id = self.outbound.register(Box::new(continuation));
        self.writer.call(RequestId::Number(id), method, params);
        id
    }

    /// Async convenience over [`call`](Self::call).
    ///
    /// # Errors
    ///
    /// Returns the client's error reply, the eviction error if the call aged
    /// out of the registry, or an internal error if the endpoint tore down
    /// before the client answered.
    pub async fn request(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<Value, ResponseError> {
        let (tx, rx) = oneshot::channel();
        self.call(method, params, move |outcome| {
            let _ = tx.send(outcome);
        });
        match rx.await {
            Ok(outcome) => outcome,
            // Continuation dropped uninvoked: the endpoint tore down first.
            Err(_) => Err(ResponseError::new(
                ErrorCode::InternalError,
                "endpoint shut down before the client replied",
            )),
        }
    }
}

/// An LSP endpoint: registered handlers plus the dispatch state machine.
pub struct Endpoint {
    config: EndpointConfig,
    handlers: HandlerRegistry,
    writer: MessageWriter,
    outgoing: mpsc::UnboundedReceiver<Message>,
    cancels: Arc<CancelRegistry>,
    outbound: Arc<OutboundRegistry>,
    tearing_down: Arc<AtomicBool>,
}

impl Endpoint {
    /// Create an endpoint with the given configuration.
    pub fn new(config: EndpointConfig) -> Self {
        let (writer, outgoing) = MessageWriter::channel();
        Self {
            outbound: Arc::new(OutboundRegistry::new(config.max_in_flight_outbound_calls)),
            cancels: Arc::new(CancelRegistry::new()),
            tearing_down: Arc::new(AtomicBool::new(false)),
            handlers: HandlerRegistry::new(),
            writer,
            outgoing,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Register a notification handler. Params are decoded into `P` before
    /// invocation; undecodable notifications are logged and dropped.
    ///
    /// # Panics
    ///
    /// Panics if the method already has a handler.
    pub fn on_notification<P, F, Fut>(&mut self, method: impl Into<String>, f: F) -> &mut Self
    where
        P: serde::de::DeserializeOwned + Send + 'static,
        F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.register_notification(method, f);
        self
    }

    /// Register a call handler. The handler must invoke its [`ReplyOnce`]
    /// exactly once, inline or from spawned work; undecodable params are
    /// answered `InvalidRequest` without invoking the handler.
    ///
    /// # Panics
    ///
    /// Panics if the method already has a handler.
    pub fn on_call<P, F, Fut>(&mut self, method: impl Into<String>, f: F) -> &mut Self
    where
        P: serde::de::DeserializeOwned + Send + 'static,
        F: Fn(P, RequestContext, ReplyOnce) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.register_call(method, f);
        self
    }

    /// A handle for server-originated notifications and calls.
    pub fn client(&self) -> Client {
        Client {
            writer: self.writer.clone(),
            outbound: Arc::clone(&self.outbound),
        }
    }

    /// Run the dispatch loop until end-of-stream, a fatal transport error, or
    /// an `exit` notification.
    ///
    /// # Errors
    ///
    /// Returns the transport error that ended the session, if any. A clean
    /// end-of-stream or `exit` returns the [`ExitStatus`].
    pub async fn serve<T: Transport>(self, transport: T) -> ServerResult<ExitStatus> {
        let Endpoint {
            config,
            handlers,
            writer,
            outgoing,
            cancels,
            outbound,
            tearing_down,
        } = self;

        let (mut reader, sink) = transport.into_split();

        // The writer task is the only holder of the write half; a failed
        // write is fatal and must also stop the read side promptly.
        let writer_failed = CancellationToken::new();
        let mut writer_task = tokio::spawn({
            let failed = writer_failed.clone();
            async move {
                let result = write_loop(sink, outgoing).await;
                if result.is_err() {
                    failed.cancel();
                }
                result
            }
        });

        let mut dispatcher = Dispatcher {
            handlers,
            writer,
            cancels,
            outbound,
            tearing_down: Arc::clone(&tearing_down),
            offset_encoding: config.default_offset_encoding,
            initialized: false,
            shutdown_requested: false,
        };

        let mut read_error: Option<ServerError> = None;
        loop {
            tokio::select! {
                () = writer_failed.cancelled() => break,
                frame = reader.recv() => match frame {
                    None => {
                        info!("client closed the stream");
                        break;
                    }
                    Some(Err(error)) => {
                        read_error = Some(error.into());
                        break;
                    }
                    Some(Ok(message)) => {
                        if dispatcher.dispatch(message).await.is_break() {
                            break;
                        }
                    }
                },
            }
        }

        let status = ExitStatus {
            shutdown_requested: dispatcher.shutdown_requested,
        };

        // Stop accepting work; reply handles dropped from here on are
        // silently abandoned.
        tearing_down.store(true, Ordering::Release);

        // Release this side's writer handle and the handler table (whose
        // closures may hold `Client` clones) so the outbound queue can close
        // once in-flight workers finish.
        drop(dispatcher);
        drop(reader);

        let write_result: TransportResult<()> =
            match tokio::time::timeout(config.shutdown_grace(), &mut writer_task).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) => {
                    return Err(ServerError::Lifecycle(format!(
                        "writer task failed: {join_error}"
                    )));
                }
                Err(_elapsed) => {
                    warn!(
                        grace_seconds = config.shutdown_grace_seconds,
                        "writer task did not drain within the grace period; aborting"
                    );
                    writer_task.abort();
                    Ok(())
                }
            };

        match read_error {
            Some(error) => Err(error),
            None => {
                write_result?;
                Ok(status)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CancelParams {
    id: RequestId,
}

/// The per-session dispatch state machine. Lives on the dispatch task only.
struct Dispatcher {
    handlers: HandlerRegistry,
    writer: MessageWriter,
    cancels: Arc<CancelRegistry>,
    outbound: Arc<OutboundRegistry>,
    tearing_down: Arc<AtomicBool>,
    offset_encoding: OffsetEncoding,
    initialized: bool,
    shutdown_requested: bool,
}

impl Dispatcher {
    async fn dispatch(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::Notification(notification) => self.on_notification(notification).await,
            Message::Request(request) => {
                self.on_call(request).await;
                ControlFlow::Continue(())
            }
            Message::Response(response) => {
                self.on_reply(response);
                ControlFlow::Continue(())
            }
        }
    }

    async fn on_notification(&mut self, notification: Notification) -> ControlFlow<()> {
        let Notification { method, params, .. } = notification;

        if method == methods::EXIT {
            info!("exit notification received; stopping dispatch loop");
            return ControlFlow::Break(());
        }
        if !self.initialized {
            warn!(method = %method, "notification before initialization; dropping");
            return ControlFlow::Continue(());
        }
        if method == methods::CANCEL_REQUEST {
            self.on_cancel(params);
            return ControlFlow::Continue(());
        }

        match self.handlers.get(&method) {
            Some(RegisteredHandler::Notification(handler)) => {
                let span = tracing::debug_span!("notification", method = %method, params = ?params);
                let ctx = RequestContext::for_notification(&method, self.offset_encoding, span.clone());
                handler(params, ctx).instrument(span).await;
            }
            Some(RegisteredHandler::Call(_)) => {
                warn!(method = %method, "notification for a request-only method; dropping");
            }
            None => {
                debug!(method = %method, "unhandled notification; dropping");
            }
        }
        ControlFlow::Continue(())
    }

    fn on_cancel(&self, params: Option<Value>) {
        match serde_json::from_value::<CancelParams>(params.unwrap_or(Value::Null)) {
            Ok(CancelParams { id }) => {
                debug!(id = %id, "client cancelled request");
                self.cancels.cancel(&id);
            }
            Err(error) => warn!(%error, "malformed $/cancelRequest; dropping"),
        }
    }

    async fn on_call(&mut self, request: Request) {
        let Request {
            id, method, params, ..
        } = request;

        let span = tracing::debug_span!("request", method = %method, id = %id, params = ?params);
        // The cancel entry is registered before the gate so ingress order
        // matches registration order even for calls that never reach a
        // handler; the context's guard reaps it.
        let (token, guard) = self.cancels.register(&id);
        let ctx = RequestContext::for_call(&method, self.offset_encoding, token, guard, span.clone());

        if !self.initialized && method != methods::INITIALIZE {
            warn!(method = %method, id = %id, "request before initialization");
            self.writer.reply(
                id,
                Err(ResponseError::new(
                    ErrorCode::ServerNotInitialized,
                    "server not initialized",
                )),
            );
            return;
        }

        let handler = match self.handlers.get(&method) {
            Some(RegisteredHandler::Call(handler)) => handler,
            Some(RegisteredHandler::Notification(_)) => {
                warn!(method = %method, id = %id, "request for a notification-only method");
                self.writer.reply(
                    id,
                    Err(ResponseError::new(ErrorCode::MethodNotFound, "method not found")),
                );
                return;
            }
            None => {
                debug!(method = %method, id = %id, "method not found");
                self.writer.reply(
                    id,
                    Err(ResponseError::new(ErrorCode::MethodNotFound, "method not found")),
                );
                return;
            }
        };

        if method == methods::SHUTDOWN {
            info!("shutdown requested");
            self.shutdown_requested = true;
        }
        let is_initialize = method == methods::INITIALIZE;

        let reply = ReplyOnce::new(
            id,
            method,
            self.writer.clone(),
            Arc::clone(&self.tearing_down),
        );
        let invocation = handler(params, ctx, reply);
        invocation.instrument(span).await;

        // `initialize` completes synchronously on the dispatch task; the gate
        // opens before the next envelope is read.
        if is_initialize {
            self.initialized = true;
        }
    }

    fn on_reply(&mut self, response: Response) {
        let Some(id) = response.id.as_ref().and_then(RequestId::as_number) else {
            warn!("reply with a non-integer or missing id; dropping");
            return;
        };
        let Some(continuation) = self.outbound.claim(id) else {
            debug!(id, "reply for an unknown outbound request; dropping");
            return;
        };
        continuation(response.into_outcome());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_call_allocates_ids_and_writes_frames() {
        let mut endpoint = Endpoint::new(EndpointConfig::default());
        let client = endpoint.client();

        let first = client.call("window/workDoneProgress/create", None, |_| {});
        let second = client.call("workspace/configuration", Some(json!({})), |_| {});
        assert_eq!(first, 0);
        assert_eq!(second, 1);

        // Frames are queued in issue order.
        match endpoint.outgoing.try_recv().unwrap() {
            Message::Request(call) => {
                assert_eq!(call.id, RequestId::Number(0));
                assert_eq!(call.method, "window/workDoneProgress/create");
            }
            other => panic!("expected request, got {other:?}"),
        }
        assert!(matches!(
            endpoint.outgoing.try_recv().unwrap(),
            Message::Request(_)
        ));
    }

    #[tokio::test]
    async fn test_client_request_resolves_through_claim() {
        let endpoint = Endpoint::new(EndpointConfig::default());
        let client = endpoint.client();

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.request("workspace/configuration", None).await }
        });

        // Let the request register, then play the client's reply.
        tokio::task::yield_now().await;
        let continuation = endpoint.outbound.claim(0).expect("request registered");
        continuation(Ok(json!(["settings"])));

        assert_eq!(pending.await.unwrap(), Ok(json!(["settings"])));
    }

    #[tokio::test]
    async fn test_client_request_errors_when_continuation_is_abandoned() {
        let endpoint = Endpoint::new(EndpointConfig::default());
        let client = endpoint.client();

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.request("workspace/configuration", None).await }
        });
        tokio::task::yield_now().await;

        // Teardown path: the stored continuation is dropped without ever
        // being invoked.
        let continuation = endpoint.outbound.claim(0).expect("request registered");
        drop(continuation);

        let error = pending.await.unwrap().unwrap_err();
        assert_eq!(error.error_code(), ErrorCode::InternalError);
    }
}

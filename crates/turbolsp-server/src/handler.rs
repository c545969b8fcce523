//! The handler table and the per-method decode gateway.
//!
//! Registration happens once, at endpoint construction; handlers are stored
//! as boxed async closures behind the method name. The gateway decodes raw
//! params into each handler's typed schema before invocation, so handlers
//! never see malformed input:
//!
//! - a call with undecodable params is answered
//!   `InvalidRequest("failed to decode request")` without invoking anything;
//! - an undecodable notification is logged and dropped.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;
use turbolsp_protocol::{ErrorCode, ResponseError};

use crate::context::RequestContext;
use crate::reply::ReplyOnce;

pub(crate) type NotifyFn =
    Box<dyn Fn(Option<Value>, RequestContext) -> BoxFuture<'static, ()> + Send + Sync>;
pub(crate) type CallFn =
    Box<dyn Fn(Option<Value>, RequestContext, ReplyOnce) -> BoxFuture<'static, ()> + Send + Sync>;

pub(crate) enum RegisteredHandler {
    Notification(NotifyFn),
    Call(CallFn),
}

/// Maps method names to registered handlers.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: HashMap<String, RegisteredHandler>,
}

fn decode_params<P: DeserializeOwned>(params: Option<Value>) -> Result<P, serde_json::Error> {
    serde_json::from_value(params.unwrap_or(Value::Null))
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a notification handler with a typed parameter schema.
    ///
    /// # Panics
    ///
    /// Panics if the method already has a handler - registering twice is a
    /// programmer error.
    pub(crate) fn register_notification<P, F, Fut>(&mut self, method: impl Into<String>, f: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let method = method.into();
        let log_method = method.clone();
        let wrapped: NotifyFn = Box::new(move |params, ctx| match decode_params::<P>(params) {
            Ok(decoded) => f(decoded, ctx).boxed(),
            Err(error) => {
                warn!(method = %log_method, %error, "failed to decode notification; dropping");
                futures::future::ready(()).boxed()
            }
        });
        self.insert(method, RegisteredHandler::Notification(wrapped));
    }

    /// Register a call handler with a typed parameter schema.
    ///
    /// The handler receives the decoded params, the request context, and the
    /// [`ReplyOnce`] handle it must eventually invoke (inline or from a
    /// spawned task).
    ///
    /// # Panics
    ///
    /// Panics if the method already has a handler.
    pub(crate) fn register_call<P, F, Fut>(&mut self, method: impl Into<String>, f: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P, RequestContext, ReplyOnce) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let method = method.into();
        let log_method = method.clone();
        let wrapped: CallFn =
            Box::new(move |params, ctx, reply| match decode_params::<P>(params) {
                Ok(decoded) => f(decoded, ctx, reply).boxed(),
                Err(error) => {
                    warn!(method = %log_method, %error, "failed to decode request");
                    reply.error(ResponseError::new(
                        ErrorCode::InvalidRequest,
                        "failed to decode request",
                    ));
                    futures::future::ready(()).boxed()
                }
            });
        self.insert(method, RegisteredHandler::Call(wrapped));
    }

    fn insert(&mut self, method: String, handler: RegisteredHandler) {
        if self.handlers.contains_key(&method) {
            panic!("handler already registered for method `{method}`");
        }
        self.handlers.insert(method, handler);
    }

    pub(crate) fn get(&self, method: &str) -> Option<&RegisteredHandler> {
        self.handlers.get(method)
    }
}

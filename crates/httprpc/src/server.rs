//! HTTP dispatcher
//!
//! [`Server`] selects a codec by the request's media type, resolves the
//! called method, binds its arguments, invokes it, and hands the outcome
//! back to the codec for encoding. Every step that fails short-circuits to
//! the error write; nothing is retried.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use httprpc_core::{
    Codec, CodecRequest, RegistryError, ReplyValue, RequestContext, ResponseWriter, RpcError,
    Service, ServiceError, ServiceRegistry, ServerConfig, write_http_error,
};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

const X_CONTENT_TYPE_OPTIONS: HeaderName = HeaderName::from_static("x-content-type-options");

/// What a hook learns about a call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInfo {
    /// `Service.Method` name, empty if the request could not be decoded
    pub method: String,
    /// Error written for the call, if any
    pub error: Option<RpcError>,
}

type Hook = dyn Fn(&RequestInfo) + Send + Sync;

/// JSON-RPC over HTTP dispatcher
///
/// Codecs and hooks are configured before serving; services may be
/// registered at any time, including while calls are being served.
pub struct Server {
    config: ServerConfig,
    codecs: HashMap<String, Arc<dyn Codec>>,
    registry: ServiceRegistry,
    before: Option<Arc<Hook>>,
    after: Option<Arc<Hook>>,
}

impl Server {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            codecs: HashMap::new(),
            registry: ServiceRegistry::new(),
            before: None,
            after: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register a codec for a media type such as `application/json`
    ///
    /// Matching ignores case. A later registration for the same media type
    /// replaces the earlier one.
    pub fn register_codec(&mut self, codec: impl Codec + 'static, media_type: &str) {
        let media_type = media_type.trim().to_ascii_lowercase();
        tracing::debug!(media_type = %media_type, "registered codec");
        self.codecs.insert(media_type, Arc::new(codec));
    }

    /// Register a service under `name`, or under its type name if `name` is empty
    pub fn register_service<S: Service>(&self, receiver: S, name: &str) -> Result<(), RegistryError> {
        self.registry.register(receiver, name)
    }

    /// Register a service shared with other code
    pub fn register_service_arc<S: Service>(
        &self,
        receiver: Arc<S>,
        name: &str,
    ) -> Result<(), RegistryError> {
        self.registry.register_arc(receiver, name)
    }

    /// Whether `Service.Method` is registered
    pub fn has_method(&self, method: &str) -> bool {
        self.registry.has_method(method)
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Run `hook` after a method is resolved and bound, before it is invoked
    pub fn on_before(&mut self, hook: impl Fn(&RequestInfo) + Send + Sync + 'static) {
        self.before = Some(Arc::new(hook));
    }

    /// Run `hook` once the reply or error has been encoded
    pub fn on_after(&mut self, hook: impl Fn(&RequestInfo) + Send + Sync + 'static) {
        self.after = Some(Arc::new(hook));
    }

    /// Handle one HTTP request
    pub fn serve(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let (ctx, body) = RequestContext::from_request(request);
        let mut writer = ResponseWriter::new();

        if self.config.require_post && ctx.method() != Method::POST {
            let message = format!("rpc: POST method required, received {}", ctx.method());
            tracing::warn!(http_method = %ctx.method(), "rejected request");
            write_http_error(&mut writer, StatusCode::METHOD_NOT_ALLOWED, &message);
            return writer.into_response();
        }

        let codec = match self.select_codec(&ctx) {
            Ok(codec) => codec,
            Err(media_type) => {
                let message = format!("rpc: unrecognized Content-Type: {media_type}");
                tracing::warn!(content_type = %media_type, "rejected request");
                write_http_error(&mut writer, StatusCode::UNSUPPORTED_MEDIA_TYPE, &message);
                return writer.into_response();
            }
        };

        let mut request = codec.new_request(&ctx, body);
        if self.config.nosniff {
            writer.set_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        }
        self.dispatch(&ctx, request.as_mut(), &mut writer);
        writer.into_response()
    }

    /// Codec for the request's media type, or the media type that has none
    fn select_codec(&self, ctx: &RequestContext) -> Result<Arc<dyn Codec>, String> {
        match ctx.media_type() {
            Some(media_type) => self.codecs.get(&media_type).cloned().ok_or(media_type),
            None if self.config.default_codec_for_missing_content_type
                && self.codecs.len() == 1 =>
            {
                self.codecs.values().next().cloned().ok_or_else(String::new)
            }
            None => Err(String::new()),
        }
    }

    fn dispatch(
        &self,
        ctx: &RequestContext,
        request: &mut dyn CodecRequest,
        writer: &mut ResponseWriter,
    ) {
        let method = match request.method() {
            Ok(method) => method,
            Err(err) => {
                self.write_failure(request, writer, String::new(), err.into());
                return;
            }
        };

        let span = tracing::debug_span!("rpc_call", method = %method);
        let _enter = span.enter();

        match self.call(ctx, request, &method) {
            Ok(reply) => {
                request.write_response(writer, reply.as_ref());
                tracing::debug!("call completed");
                self.notify(self.after.as_deref(), method, None);
            }
            Err(err) => self.write_failure(request, writer, method, err),
        }
    }

    fn call(
        &self,
        ctx: &RequestContext,
        request: &mut dyn CodecRequest,
        method: &str,
    ) -> Result<Box<dyn ReplyValue>, ServiceError> {
        let spec = self.registry.resolve(method)?;
        let mut args = spec.new_args();
        request.read_request(args.as_mut())?;

        self.notify(self.before.as_deref(), method.to_string(), None);

        match panic::catch_unwind(AssertUnwindSafe(|| spec.invoke(ctx, args))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic = %message, "method panicked");
                Err(RpcError::internal_error(format!("rpc: method panicked: {message}")).into())
            }
        }
    }

    fn write_failure(
        &self,
        request: &dyn CodecRequest,
        writer: &mut ResponseWriter,
        method: String,
        err: ServiceError,
    ) {
        let rpc = err.to_rpc_error();
        tracing::warn!(code = %rpc.code, error = %rpc.message, "call failed");
        request.write_error(writer, StatusCode::BAD_REQUEST, &err);
        self.notify(self.after.as_deref(), method, Some(rpc));
    }

    fn notify(&self, hook: Option<&Hook>, method: String, error: Option<RpcError>) {
        if let Some(hook) = hook {
            hook(&RequestInfo { method, error });
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut media_types: Vec<&String> = self.codecs.keys().collect();
        media_types.sort();
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("codecs", &media_types)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Convert a panic payload to a human-readable string
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

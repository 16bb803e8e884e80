//! JSON-RPC 2.0 codec

use crate::envelope::{ServerRequest, ServerResponse};
use bytes::Bytes;
use http::StatusCode;
use http::header::{self, HeaderValue};
use httprpc_core::{
    ArgsValue, Codec, CodecRequest, DefaultEncoderSelector, Encoder, EncoderSelector, ReplyValue,
    RequestContext, ResponseWriter, RpcError, ServiceError, write_http_error,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Media type the codec is usually registered under
pub const CONTENT_TYPE: &str = "application/json";

const RESPONSE_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Creates a [`JsonRpcRequest`] for each call
#[derive(Clone)]
pub struct JsonRpcCodec {
    selector: Arc<dyn EncoderSelector>,
}

impl JsonRpcCodec {
    /// Create a codec that writes responses unchanged
    pub fn new() -> Self {
        Self {
            selector: Arc::new(DefaultEncoderSelector),
        }
    }

    /// Create a codec that picks an encoder per request
    pub fn with_encoder_selector(selector: impl EncoderSelector + 'static) -> Self {
        Self {
            selector: Arc::new(selector),
        }
    }
}

impl Default for JsonRpcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JsonRpcCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcCodec").finish_non_exhaustive()
    }
}

impl Codec for JsonRpcCodec {
    fn new_request(&self, ctx: &RequestContext, body: Bytes) -> Box<dyn CodecRequest> {
        let raw = RawCodecRequest::decode(&body);
        drop(body);
        Box::new(JsonRpcRequest {
            raw,
            encoder: self.selector.select(ctx),
        })
    }
}

/// A decoded call, independent of any transport
///
/// Responses are produced as bytes; writing them anywhere is left to the
/// caller.
#[derive(Debug, Clone)]
pub struct RawCodecRequest {
    request: ServerRequest,
    error: Option<RpcError>,
}

impl RawCodecRequest {
    /// Decode a request body; errors are kept and reported later
    pub fn decode(body: &[u8]) -> Self {
        let (request, error) = ServerRequest::decode(body);
        if let Some(err) = &error {
            tracing::debug!(code = %err.code, error = %err.message, "rejected json-rpc envelope");
        }
        Self { request, error }
    }

    /// The decoded envelope
    pub fn request(&self) -> &ServerRequest {
        &self.request
    }

    pub fn is_notification(&self) -> bool {
        self.request.is_notification()
    }

    /// The method name, or the error recorded while decoding
    pub fn method(&self) -> Result<String, RpcError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.request.method.clone()),
        }
    }

    /// Bind the params to `args`
    ///
    /// Params are first bound by name. If that fails they are bound by
    /// position, as a single-element array holding the arguments. Absent
    /// params leave `args` at its zero value.
    pub fn read_request(&mut self, args: &mut dyn ArgsValue) -> Result<(), RpcError> {
        if self.error.is_none() {
            if let Some(raw) = &self.request.params {
                if let Err(err) = bind_params(raw.get(), args) {
                    tracing::debug!(
                        args = args.type_name(),
                        error = %err.message,
                        "params did not bind"
                    );
                    self.error = Some(err);
                }
            }
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Encode a success response; `None` for notifications
    pub fn encode_response(
        &self,
        reply: &dyn ReplyValue,
    ) -> Result<Option<Vec<u8>>, serde_json::Error> {
        if self.is_notification() {
            return Ok(None);
        }
        let result = reply.to_raw_value()?;
        ServerResponse::success(self.request.id.as_deref(), result)
            .to_bytes()
            .map(Some)
    }

    /// Encode an error response; `None` for notifications
    ///
    /// Structured errors are written as they are. Any other failure becomes
    /// a server error carrying its message.
    pub fn encode_error(&self, err: &ServiceError) -> Result<Option<Vec<u8>>, serde_json::Error> {
        if self.is_notification() {
            return Ok(None);
        }
        ServerResponse::failure(self.request.id.as_deref(), err.to_rpc_error())
            .to_bytes()
            .map(Some)
    }
}

fn bind_params(raw: &str, args: &mut dyn ArgsValue) -> Result<(), RpcError> {
    let params: Value = serde_json::from_str(raw)
        .map_err(|err| RpcError::invalid_request(err.to_string()))?;
    match args.bind(&params) {
        Ok(()) => Ok(()),
        Err(by_name) => match args.bind_positional(&params) {
            Ok(()) => Ok(()),
            Err(_) => Err(RpcError::invalid_request(by_name.to_string()).with_data(params)),
        },
    }
}

/// A call received over HTTP
pub struct JsonRpcRequest {
    raw: RawCodecRequest,
    encoder: Arc<dyn Encoder>,
}

impl JsonRpcRequest {
    pub fn raw(&self) -> &RawCodecRequest {
        &self.raw
    }

    fn write_encoded(
        &self,
        writer: &mut ResponseWriter,
        encoded: Result<Option<Vec<u8>>, serde_json::Error>,
    ) {
        let payload = match encoded {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode json-rpc response");
                write_http_error(writer, StatusCode::BAD_REQUEST, &err.to_string());
                return;
            }
        };
        writer.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static(RESPONSE_CONTENT_TYPE),
        );
        if let Err(err) = self.encoder.encode(writer, &payload) {
            tracing::warn!(error = %err, "failed to write json-rpc response");
            write_http_error(writer, StatusCode::BAD_REQUEST, &err.to_string());
        }
    }
}

impl fmt::Debug for JsonRpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcRequest")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

impl CodecRequest for JsonRpcRequest {
    fn method(&self) -> Result<String, RpcError> {
        self.raw.method()
    }

    fn read_request(&mut self, args: &mut dyn ArgsValue) -> Result<(), RpcError> {
        self.raw.read_request(args)
    }

    fn write_response(&self, writer: &mut ResponseWriter, reply: &dyn ReplyValue) {
        let encoded = self.raw.encode_response(reply);
        self.write_encoded(writer, encoded);
    }

    fn write_error(&self, writer: &mut ResponseWriter, _status: StatusCode, err: &ServiceError) {
        let encoded = self.raw.encode_error(err);
        self.write_encoded(writer, encoded);
    }
}

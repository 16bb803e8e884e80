//! Protocol-independent codec interface
//!
//! A [`Codec`] is registered once per media type. For every inbound call it
//! produces a [`CodecRequest`] that owns the decoded body and knows how to
//! write a reply or an error in its wire format. The dispatcher only
//! orchestrates; it never parses bytes itself.

use crate::registry::{ArgsValue, ReplyValue};
use crate::{RequestContext, ResponseWriter, RpcError, ServiceError};
use bytes::Bytes;
use http::StatusCode;
use std::sync::Arc;

/// Factory for per-request codec instances
pub trait Codec: Send + Sync {
    /// Decode a request body
    ///
    /// The body is consumed so it is released once parsing finishes,
    /// whether or not it parsed. Must not block on I/O.
    fn new_request(&self, ctx: &RequestContext, body: Bytes) -> Box<dyn CodecRequest>;
}

/// Decodes and encodes a single call
pub trait CodecRequest: Send {
    /// The `Service.Method` name of the call, or the error recorded while decoding
    fn method(&self) -> Result<String, RpcError>;

    /// Fill `args` from the call parameters
    fn read_request(&mut self, args: &mut dyn ArgsValue) -> Result<(), RpcError>;

    /// Encode a successful reply
    fn write_response(&self, writer: &mut ResponseWriter, reply: &dyn ReplyValue);

    /// Encode a failure
    ///
    /// `status` is a hint; protocols that report errors in-band may ignore it.
    fn write_error(&self, writer: &mut ResponseWriter, status: StatusCode, err: &ServiceError);
}

/// Writes an encoded payload into the response
///
/// Lets a transport wrap the body (compression, for instance) without the
/// codec knowing about it.
pub trait Encoder: Send + Sync {
    fn encode(&self, writer: &mut ResponseWriter, payload: &[u8]) -> std::io::Result<()>;
}

/// Picks an [`Encoder`] for a request
pub trait EncoderSelector: Send + Sync {
    fn select(&self, ctx: &RequestContext) -> Arc<dyn Encoder>;
}

impl<F> EncoderSelector for F
where
    F: Fn(&RequestContext) -> Arc<dyn Encoder> + Send + Sync,
{
    fn select(&self, ctx: &RequestContext) -> Arc<dyn Encoder> {
        self(ctx)
    }
}

/// Encoder that writes the payload unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEncoder;

impl Encoder for IdentityEncoder {
    fn encode(&self, writer: &mut ResponseWriter, payload: &[u8]) -> std::io::Result<()> {
        writer.write(payload);
        Ok(())
    }
}

/// Selector that always returns [`IdentityEncoder`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEncoderSelector;

impl EncoderSelector for DefaultEncoderSelector {
    fn select(&self, _ctx: &RequestContext) -> Arc<dyn Encoder> {
        Arc::new(IdentityEncoder)
    }
}

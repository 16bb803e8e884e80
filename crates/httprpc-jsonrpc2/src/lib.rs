//! httprpc-jsonrpc2 - JSON-RPC 2.0 codec
//!
//! This crate provides:
//! - [`JsonRpcCodec`], the [`httprpc_core::Codec`] for JSON-RPC 2.0 over HTTP
//! - [`RawCodecRequest`] for decoding and encoding calls without a transport
//! - [`ServerRequest`] and [`ServerResponse`] envelopes
//! - client helpers to build calls and read responses

mod client;
mod codec;
mod envelope;

pub use client::{
    ClientError, decode_client_response, encode_client_notification, encode_client_request,
};
pub use codec::{CONTENT_TYPE, JsonRpcCodec, JsonRpcRequest, RawCodecRequest};
pub use envelope::{ServerRequest, ServerResponse, VERSION};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{ClientError, JsonRpcCodec, RawCodecRequest, ServerRequest, ServerResponse};
}

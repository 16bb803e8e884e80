//! # httprpc
//!
//! Expose methods of ordinary Rust values as JSON-RPC 2.0 calls over HTTP.
//!
//! httprpc sits between an HTTP transport and your services:
//! - Services are registered under a name and called as `Service.Method`
//! - Codecs are selected by the request's `Content-Type`
//! - JSON-RPC 2.0 is provided, including notifications and by-position params
//! - Handlers return structured errors that reach the caller unchanged
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! httprpc = "0.3"
//! ```
//!
//! ## Creating a Service
//!
//! ```ignore
//! use httprpc::prelude::*;
//!
//! #[derive(Debug, Default, Deserialize)]
//! pub struct MultiplyArgs {
//!     #[serde(rename = "A")]
//!     pub a: i64,
//!     #[serde(rename = "B")]
//!     pub b: i64,
//! }
//!
//! #[derive(Debug, Default, Serialize)]
//! pub struct MultiplyReply {
//!     #[serde(rename = "Result")]
//!     pub result: i64,
//! }
//!
//! #[derive(Default)]
//! pub struct Arith;
//!
//! #[rpc_service]
//! impl Arith {
//!     pub fn multiply(
//!         &self,
//!         _ctx: &RequestContext,
//!         args: &MultiplyArgs,
//!         reply: &mut MultiplyReply,
//!     ) -> ServiceResult {
//!         reply.result = args.a * args.b;
//!         Ok(())
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.register_codec(JsonRpcCodec::new(), "application/json");
//! server.register_service(Arith, "")?;
//!
//! // Hand every HTTP request of your transport to the server
//! let response = server.serve(request);
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`httprpc_core`] - Registry, codec traits, errors, and configuration
//! - [`httprpc_jsonrpc2`] - The JSON-RPC 2.0 codec
//! - [`httprpc_macros`] - The `#[rpc_service]` attribute
//! - [`httprpc_logging`] - `tracing` subscriber setup

mod server;

pub use server::{RequestInfo, Server};

// Re-export core types
pub use httprpc_core::{
    ArgsValue, Codec, CodecRequest, ConfigError, DefaultEncoderSelector, Encoder,
    EncoderSelector, ErrorCode, IdentityEncoder, LogLevel, MethodSpec, RegistryError, ReplyValue,
    RequestContext, ResponseWriter, RpcError, ServerConfig, Service, ServiceBuilder, ServiceError,
    ServiceRegistry, ServiceResult, TypedArgs, infer_service_name, write_http_error,
};

// Re-export the JSON-RPC 2.0 codec
pub use httprpc_jsonrpc2 as jsonrpc2;
pub use httprpc_jsonrpc2::JsonRpcCodec;

// Re-export logging setup
pub use httprpc_logging::{LoggingError, ReloadHandle, init_logging, init_logging_from_config};

// Re-export macros
pub use httprpc_macros::rpc_service;

// Re-export common dependencies that service authors need
pub use anyhow;
pub use bytes;
pub use http;
pub use serde;
pub use serde_json;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use httprpc::prelude::*;` to import commonly used types.
///
/// This includes:
/// - The dispatcher: `Server`, `JsonRpcCodec`
/// - Handler types: `RequestContext`, `RpcError`, `ServiceError`, `ServiceResult`
/// - The `#[rpc_service]` attribute
/// - Serde derives: `Serialize`, `Deserialize`
pub mod prelude {
    pub use crate::{
        ErrorCode, JsonRpcCodec, RequestContext, RequestInfo, RpcError, Server, ServerConfig,
        Service, ServiceBuilder, ServiceError, ServiceResult, rpc_service,
    };

    // Serde derives (commonly needed for args and reply types)
    pub use serde::{Deserialize, Serialize};
}

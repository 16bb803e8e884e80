//! Client-side helpers for the same wire format

use crate::envelope::VERSION;
use httprpc_core::RpcError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Errors returned by [`decode_client_response`]
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with an error object
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The response carries neither a result nor an error
    #[error("result is null")]
    NullResult,

    /// The response is not valid JSON-RPC
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ClientRequest<'a, A> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a A,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
}

#[derive(Deserialize)]
struct ClientResponse {
    #[serde(default)]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<Box<RawValue>>,
}

/// Encode a call with a fresh process-unique id
pub fn encode_client_request<A: Serialize>(
    method: &str,
    args: &A,
) -> Result<Vec<u8>, serde_json::Error> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    encode(method, args, Some(id))
}

/// Encode a call that expects no response
pub fn encode_client_notification<A: Serialize>(
    method: &str,
    args: &A,
) -> Result<Vec<u8>, serde_json::Error> {
    encode(method, args, None)
}

fn encode<A: Serialize>(method: &str, args: &A, id: Option<u64>) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&ClientRequest {
        jsonrpc: VERSION,
        method,
        params: args,
        id,
    })
}

/// Decode a response body into the reply type
///
/// An error member that is not a well-formed error object is reported as a
/// server error carrying its raw text.
pub fn decode_client_response<R: DeserializeOwned>(body: &[u8]) -> Result<R, ClientError> {
    let response: ClientResponse = serde_json::from_slice(body)?;
    if let Some(raw) = response.error.filter(|raw| raw.get() != "null") {
        let err = serde_json::from_str::<RpcError>(raw.get())
            .unwrap_or_else(|_| RpcError::server_error(raw.get()));
        return Err(ClientError::Rpc(err));
    }
    match response.result {
        Some(raw) if raw.get() != "null" => Ok(serde_json::from_str(raw.get())?),
        _ => Err(ClientError::NullResult),
    }
}

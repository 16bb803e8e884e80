//! Request and response envelopes of the JSON-RPC 2.0 wire format

use httprpc_core::RpcError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::RawValue;
use std::collections::BTreeMap;

type Members = BTreeMap<String, Box<RawValue>>;

/// Protocol version carried in every envelope
pub const VERSION: &str = "2.0";

/// A JSON-RPC request as received by the server
///
/// `params` and `id` are kept as raw JSON text. The id is never type
/// checked; it is echoed back byte for byte. A missing or `null` id marks
/// a notification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerRequest {
    /// Protocol version (`jsonrpc` member)
    #[serde(rename = "jsonrpc")]
    pub version: String,

    /// `Service.Method` name of the call
    pub method: String,

    /// Arguments, by name (object) or by position (array)
    pub params: Option<Box<RawValue>>,

    /// Request id
    pub id: Option<Box<RawValue>>,
}

impl ServerRequest {
    /// Decode a request body
    ///
    /// Decoding is best effort. A member of the wrong type is recorded as a
    /// parse error while the other members are still filled in, so the id
    /// can be echoed. A body that parsed as an object but carries the wrong
    /// version yields an invalid-request error instead.
    pub fn decode(body: &[u8]) -> (Self, Option<RpcError>) {
        let mut request = ServerRequest::default();

        // Only the first value is read; anything after it is ignored
        let first = serde_json::Deserializer::from_slice(body)
            .into_iter::<Members>()
            .next();
        let decoded = match first {
            Some(decoded) => decoded,
            None => serde_json::from_slice::<Members>(body),
        };
        let members = match decoded {
            Ok(members) => members,
            Err(err) => {
                let error = RpcError::parse_error(err.to_string()).with_data(request.to_data());
                return (request, Some(error));
            }
        };

        let mut failure: Option<String> = None;
        for (name, raw) in members {
            match name.as_str() {
                "jsonrpc" => match decode_member::<String>(&name, &raw) {
                    Ok(version) => request.version = version.unwrap_or_default(),
                    Err(msg) => {
                        failure.get_or_insert(msg);
                    }
                },
                "method" => match decode_member::<String>(&name, &raw) {
                    Ok(method) => request.method = method.unwrap_or_default(),
                    Err(msg) => {
                        failure.get_or_insert(msg);
                    }
                },
                "params" => request.params = non_null(raw),
                "id" => request.id = non_null(raw),
                _ => {}
            }
        }

        let error = if request.version != VERSION {
            Some(RpcError::invalid_request(format!("jsonrpc must be {VERSION}")))
        } else {
            failure.map(RpcError::parse_error)
        };
        let error = error.map(|err| err.with_data(request.to_data()));
        (request, error)
    }

    /// Whether the caller expects no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The envelope as diagnostic data for an error
    pub fn to_data(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn decode_member<T: DeserializeOwned>(name: &str, raw: &RawValue) -> Result<Option<T>, String> {
    serde_json::from_str::<Option<T>>(raw.get())
        .map_err(|err| format!("invalid `{name}` member: {err}"))
}

fn non_null(raw: Box<RawValue>) -> Option<Box<RawValue>> {
    if raw.get() == "null" { None } else { Some(raw) }
}

/// A JSON-RPC response written by the server
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct ServerResponse<'a> {
    #[serde(rename = "jsonrpc")]
    pub version: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,

    /// Copy of the request id
    pub id: Option<&'a RawValue>,
}

impl<'a> ServerResponse<'a> {
    /// Create a success response
    pub fn success(id: Option<&'a RawValue>, result: Box<RawValue>) -> Self {
        Self {
            version: VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn failure(id: Option<&'a RawValue>, error: RpcError) -> Self {
        Self {
            version: VERSION,
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Compact JSON followed by a newline
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = serde_json::to_vec(self)?;
        out.push(b'\n');
        Ok(out)
    }
}

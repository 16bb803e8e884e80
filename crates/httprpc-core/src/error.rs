//! Error types for httprpc services and protocols

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Result type alias for service handlers
pub type ServiceResult<T = ()> = Result<T, ServiceError>;

/// Numeric error codes following the JSON-RPC 2.0 ranges
///
/// Serializes as a bare integer. Codes outside the standard set are kept
/// as [`ErrorCode::Custom`] so handlers can pick their own business codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Invalid JSON was received (-32700)
    ParseError,
    /// The body is not a valid request object (-32600)
    InvalidRequest,
    /// The method does not exist or is not available (-32601)
    MethodNotFound,
    /// Invalid method parameters (-32602)
    InvalidParams,
    /// Internal protocol error (-32603)
    InternalError,
    /// Generic server failure (-32000)
    ServerError,
    /// Application-defined code
    Custom(i32),
}

impl ErrorCode {
    /// Returns the wire value of this code
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerError => -32000,
            ErrorCode::Custom(code) => *code,
        }
    }

    /// Maps a wire value back to a code, normalizing the standard values
    pub fn from_code(code: i32) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            -32000 => ErrorCode::ServerError,
            other => ErrorCode::Custom(other),
        }
    }

    /// Short description used when no better message is available
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ServerError => "Server error",
            ErrorCode::Custom(_) => "Application error",
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        ErrorCode::from_code(code)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(ErrorCode::from_code)
    }
}

/// Structured protocol error: `{code, message, data}`
///
/// Handlers may return one of these to choose the code, message, and data
/// that reach the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct RpcError {
    /// Error code
    pub code: ErrorCode,
    /// Human readable message
    pub message: String,
    /// Optional diagnostic data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Create an error with an arbitrary code
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach diagnostic data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotFound, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Wrap an arbitrary failure as a generic server error
    pub fn server_error(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ServerError, err.to_string())
    }
}

/// Error returned by a service method
///
/// `Rpc` carries a structured protocol error that is written as-is.
/// `Failure` carries anything else and is written as a server error.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Rpc(RpcError),

    #[error(transparent)]
    Failure(anyhow::Error),
}

impl ServiceError {
    /// Create a generic failure from a message
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        ServiceError::Failure(anyhow::Error::msg(message))
    }

    /// Protocol error to put on the wire for this failure
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            ServiceError::Rpc(err) => err.clone(),
            ServiceError::Failure(err) => RpcError::server_error(err),
        }
    }

    /// Consuming variant of [`ServiceError::to_rpc_error`]
    pub fn into_rpc_error(self) -> RpcError {
        match self {
            ServiceError::Rpc(err) => err,
            ServiceError::Failure(err) => RpcError::server_error(err),
        }
    }
}

impl From<RpcError> for ServiceError {
    fn from(err: RpcError) -> Self {
        ServiceError::Rpc(err)
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RpcError>() {
            Ok(rpc) => ServiceError::Rpc(rpc),
            Err(other) => ServiceError::Failure(other),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        ServiceError::Rpc(err.into())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Failure(err.into())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Failure(err.into())
    }
}

impl From<String> for ServiceError {
    fn from(message: String) -> Self {
        ServiceError::msg(message)
    }
}

impl From<&str> for ServiceError {
    fn from(message: &str) -> Self {
        ServiceError::msg(message.to_string())
    }
}

/// Errors raised while registering or resolving services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A service with this name is already registered
    #[error("rpc: service already defined: {0}")]
    DuplicateService(String),

    /// The receiver exposes no method matching the dispatch contract
    #[error("rpc: {0} has no exported methods of suitable type")]
    NoEligibleMethods(String),

    /// Service names must be non-empty and free of '.'
    #[error("rpc: invalid service name: {0:?}")]
    InvalidServiceName(String),

    /// The requested method is not of the form "Service.Method"
    #[error("rpc: service/method request ill-formed: {0:?}")]
    MalformedMethodName(String),

    /// Unknown service or unknown method
    #[error("rpc: can't find method {0:?}")]
    MethodNotFound(String),
}

impl From<RegistryError> for RpcError {
    fn from(err: RegistryError) -> Self {
        let code = match &err {
            RegistryError::MalformedMethodName(_) => ErrorCode::InvalidRequest,
            RegistryError::MethodNotFound(_) => ErrorCode::MethodNotFound,
            _ => ErrorCode::ServerError,
        };
        RpcError::new(code, err.to_string())
    }
}

//! httprpc-core - Service registry, codec abstraction, and error model
//!
//! This crate provides the protocol-independent pieces of httprpc:
//! - [`ServiceRegistry`] and [`Service`] for exposing methods as `Service.Method`
//! - [`Codec`] and [`CodecRequest`] for plugging in wire protocols
//! - [`RpcError`] and [`ServiceError`] for error handling
//! - [`ServerConfig`] for dispatcher configuration

mod codec;
mod config;
mod error;
mod registry;
mod request;

pub use codec::{
    Codec, CodecRequest, DefaultEncoderSelector, Encoder, EncoderSelector, IdentityEncoder,
};
pub use config::{ConfigError, ServerConfig};
pub use error::{ErrorCode, RegistryError, RpcError, ServiceError, ServiceResult};
pub use registry::{
    ArgsValue, MethodSpec, ReplyValue, Service, ServiceBuilder, ServiceRegistry, TypedArgs,
    infer_service_name,
};
pub use request::{RequestContext, ResponseWriter, write_http_error};

/// Log levels accepted in configuration
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" => Ok(LogLevel::Off),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ErrorCode, LogLevel, MethodSpec, RequestContext, RpcError, Service, ServiceBuilder,
        ServiceError, ServiceRegistry, ServiceResult,
    };
}

#[cfg(test)]
mod lib_tests;

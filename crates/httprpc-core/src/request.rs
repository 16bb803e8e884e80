//! Request and response context types

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::request::Parts;
use http::{Extensions, Method, StatusCode, Uri};

/// Context for an incoming HTTP call
///
/// Holds everything about the inbound request except its body, which is
/// handed to the codec separately. Service methods receive it as their
/// first parameter.
#[derive(Debug)]
pub struct RequestContext {
    parts: Parts,
}

impl RequestContext {
    /// Create a context from request head parts
    pub fn new(parts: Parts) -> Self {
        Self { parts }
    }

    /// Split a request into its context and body
    pub fn from_request<B>(request: http::Request<B>) -> (Self, B) {
        let (parts, body) = request.into_parts();
        (Self::new(parts), body)
    }

    /// HTTP method of the call
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Request URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get a header as a string, ignoring values that are not visible ASCII
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request extensions (set by middleware in the transport layer)
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Raw request head
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Media type of the `Content-Type` header, lowercased and without
    /// parameters such as `charset`
    pub fn media_type(&self) -> Option<String> {
        let raw = self.header(CONTENT_TYPE)?;
        let media = raw.split(';').next().unwrap_or_default().trim();
        if media.is_empty() {
            None
        } else {
            Some(media.to_ascii_lowercase())
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        let (parts, ()) = http::Request::new(()).into_parts();
        Self::new(parts)
    }
}

/// Buffered HTTP response under construction
///
/// Codecs write status, headers, and body here; the dispatcher turns it
/// into an `http::Response` once the call is finished.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    /// Create an empty `200 OK` response
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a header, replacing any previous value
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Append bytes to the body
    pub fn write(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Body written so far
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Discard everything written to the body
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Build the final response
    pub fn into_response(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a plain-text transport-level error
///
/// Replaces any body already written.
pub fn write_http_error(writer: &mut ResponseWriter, status: StatusCode, message: &str) {
    writer.set_header(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    writer.set_status(status);
    writer.clear_body();
    writer.write(message.as_bytes());
}

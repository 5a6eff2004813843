//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};

use crate::error::Error;

/// An incoming HTTP request as seen by middleware and handlers.
///
/// Besides the usual method, URI, headers, and body, a request carries
/// typed [`Extensions`]: the per-request slot middleware uses to hand values
/// to the handlers it wraps. Values are keyed by their type, so a slot can
/// never hold something other than what its reader expects.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) extensions: Extensions,
}

impl Request {
    /// A request with no headers, no body, and no known peer.
    ///
    /// An invalid `uri` is a `400 Bad Request` error.
    pub fn parse(method: Method, uri: &str) -> Result<Self, Error> {
        let uri: Uri = uri
            .parse()
            .map_err(|e| Error::new(StatusCode::BAD_REQUEST, format!("invalid uri `{uri}`: {e}")))?;
        Ok(Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
            extensions: Extensions::new(),
        })
    }

    /// Shorthand for [`Request::parse`] on a literal target, for tests and
    /// demos. Servers build requests with [`Request::from_parts`].
    ///
    /// # Panics
    ///
    /// Panics if `uri` is not a valid request target.
    pub fn new(method: Method, uri: &str) -> Self {
        Self::parse(method, uri).unwrap_or_else(|e| panic!("{}", e.message()))
    }

    /// Builds a request from hyper/http parts and an already-collected body.
    pub fn from_parts(parts: http::request::Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            remote_addr,
            extensions: parts.extensions,
        }
    }

    /// Adds a header. Returns `self` for chaining. Meant for tests and demos
    /// that spell headers out literally; use [`Request::headers_mut`] when
    /// the name or value comes from elsewhere.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `value` is not a valid header component.
    pub fn header_value(mut self, name: &str, value: &str) -> Self {
        let key = HeaderName::from_bytes(name.as_bytes())
            .unwrap_or_else(|e| panic!("invalid header name `{name}`: {e}"));
        let value = HeaderValue::from_str(value)
            .unwrap_or_else(|e| panic!("invalid value for header `{name}`: {e}"));
        self.headers.append(key, value);
        self
    }

    pub fn remote(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Path plus query string, exactly as requested (`/widgets?page=2`).
    pub fn request_uri(&self) -> &str {
        self.uri.path_and_query().map_or_else(|| self.uri.path(), |pq| pq.as_str())
    }

    /// Case-insensitive header lookup. Any UTF-8 value is returned as is;
    /// values that are not UTF-8 read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uri_keeps_the_query() {
        let req = Request::new(Method::GET, "/widgets?page=2");
        assert_eq!(req.request_uri(), "/widgets?page=2");
        assert_eq!(req.uri().path(), "/widgets");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::GET, "/").header_value("x-request-id", "abc123");
        assert_eq!(req.header("X-Request-Id"), Some("abc123"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn header_lookup_returns_non_ascii_utf8() {
        let mut req = Request::new(Method::GET, "/");
        req.headers_mut().insert("x-request-id", HeaderValue::from_bytes("réq-1".as_bytes()).unwrap());
        req.headers_mut().insert("x-raw", HeaderValue::from_bytes(&[0x66, 0xff]).unwrap());

        assert_eq!(req.header("x-request-id"), Some("réq-1"));
        assert_eq!(req.header("x-raw"), None);
    }

    #[test]
    fn parse_rejects_invalid_targets_with_bad_request() {
        let err = Request::parse(Method::GET, "/a b").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("invalid uri `/a b`"), "{}", err.message());

        let req = Request::parse(Method::GET, "/widgets?page=2").unwrap();
        assert_eq!(req.request_uri(), "/widgets?page=2");
    }

    #[test]
    #[should_panic(expected = "invalid uri")]
    fn new_panics_on_invalid_targets() {
        Request::new(Method::GET, "/a b");
    }

    #[test]
    fn builder_methods_fill_in_peer_and_body() {
        let req = Request::new(Method::PUT, "/widgets/1")
            .remote("192.0.2.1:8080".parse().unwrap())
            .body_bytes(&b"payload"[..]);
        assert_eq!(req.remote_addr().map(|a| a.port()), Some(8080));
        assert_eq!(req.body(), b"payload");
    }
}

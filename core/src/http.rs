//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! A request is plain data: method, absolute path, and a key-value
//! parameter list. The core never encodes parameters, constructs headers,
//! or authenticates — the caller (host) executes the request, sending the
//! parameters as a query string for GET and as a form body for POST, with
//! the credentials from [`crate::Config`] applied as HTTP Basic Auth.
//!
//! Responses have no structured type here: Simpy signals errors inside the
//! XML body (see [`crate::StatusResponse`]), so the host hands the raw body
//! text straight to the `parse_*` methods.

/// HTTP method for a request. Simpy reads with GET and mutates with POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// Built by `SimpyClient::build_*` methods. The caller is responsible for
/// executing it and returning the response body text to the matching
/// `parse_*` method.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Vec<(String, String)>,
}

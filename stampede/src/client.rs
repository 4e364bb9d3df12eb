//! The client capability a task runs against.
//!
//! A [`Client`] is supplied by the engine driving a
//! [`UserBehavior`](crate::UserBehavior) and is bound to the descriptor's
//! host: task code addresses requests by path (`client.get("/")`) and the
//! client resolves them against the host it was constructed with.

use std::fmt;
use std::future::Future;
use url::Url;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

/// HTTP verbs a task can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request a task hands to the client, addressed by path relative to
/// the descriptor's host.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// What a task can observe about a completed request.
///
/// Whether a non-2xx status counts as a failure is the caller's policy; the
/// client only reports what came back.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Errors surfaced by a client capability.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid url for path `{path}`: {source}")]
    Url {
        path: String,
        source: url::ParseError,
    },

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Resolve a task-supplied path against the host a client is bound to.
pub fn resolve(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path).map_err(|source| ClientError::Url {
        path: path.to_string(),
        source,
    })
}

/// The capability contract an engine supplies to tasks.
///
/// Implementations are bound to a host at construction; [`send`](Client::send)
/// is the only required method, the verb helpers are thin wrappers over it.
/// Clients must be cheap to clone since the engine hands one to every task
/// invocation.
pub trait Client: Clone + Send + Sync + 'static {
    fn send(&self, req: Request) -> impl Future<Output = Result<Response, ClientError>> + Send;

    fn get(&self, path: &str) -> impl Future<Output = Result<Response, ClientError>> + Send {
        self.send(Request::new(Method::Get, path))
    }

    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Response, ClientError>> + Send {
        self.send(Request::new(Method::Post, path).with_body(body))
    }

    fn put(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Response, ClientError>> + Send {
        self.send(Request::new(Method::Put, path).with_body(body))
    }

    fn delete(&self, path: &str) -> impl Future<Output = Result<Response, ClientError>> + Send {
        self.send(Request::new(Method::Delete, path))
    }

    fn head(&self, path: &str) -> impl Future<Output = Result<Response, ClientError>> + Send {
        self.send(Request::new(Method::Head, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_root_path() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let url = resolve(&base, "/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/");
    }

    #[test]
    fn resolves_nested_path() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let url = resolve(&base, "/api/users?page=2").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/users?page=2");
    }

    #[test]
    fn response_success_bounds() {
        assert!(Response::new(200, vec![]).is_success());
        assert!(Response::new(299, vec![]).is_success());
        assert!(!Response::new(199, vec![]).is_success());
        assert!(!Response::new(500, vec![]).is_success());
    }

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}

//! Reference [`Client`] implementation backed by `reqwest`.

use super::{resolve, Client, ClientError, Method, Request, Response};
use std::future::Future;
use url::Url;

/// A [`Client`] bound to a host, delegating transport to [`reqwest`].
///
/// Connection pooling lives inside the shared `reqwest::Client`, so cloning
/// this handle per simulated user is cheap.
#[derive(Clone)]
pub struct ReqwestClient {
    base: Url,
    inner: ::reqwest::Client,
}

impl ReqwestClient {
    /// Bind a client to `host`, typically the owning descriptor's
    /// [`host()`](crate::UserBehavior::host).
    pub fn new(host: &str) -> Result<Self, ClientError> {
        Self::with_client(host, ::reqwest::Client::new())
    }

    /// Bind to `host` reusing a caller-configured `reqwest::Client`.
    pub fn with_client(host: &str, inner: ::reqwest::Client) -> Result<Self, ClientError> {
        let base = Url::parse(host).map_err(|source| ClientError::Url {
            path: host.to_string(),
            source,
        })?;
        Ok(Self { base, inner })
    }
}

impl Client for ReqwestClient {
    fn send(&self, req: Request) -> impl Future<Output = Result<Response, ClientError>> + Send {
        let url = resolve(&self.base, &req.path);
        let inner = self.inner.clone();

        async move {
            let url = url?;

            let method = match req.method {
                Method::Get => ::reqwest::Method::GET,
                Method::Post => ::reqwest::Method::POST,
                Method::Put => ::reqwest::Method::PUT,
                Method::Delete => ::reqwest::Method::DELETE,
                Method::Patch => ::reqwest::Method::PATCH,
                Method::Head => ::reqwest::Method::HEAD,
            };

            let mut builder = inner.request(method, url);
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let res = builder
                .send()
                .await
                .map_err(|e| ClientError::Transport(Box::new(e)))?;

            let status = res.status().as_u16();
            let body = res
                .bytes()
                .await
                .map_err(|e| ClientError::Transport(Box::new(e)))?
                .to_vec();

            Ok(Response::new(status, body))
        }
    }
}

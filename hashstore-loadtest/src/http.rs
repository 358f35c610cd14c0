//! Contains the HTTP remote used to talk to the hashstore service.

use anyhow::Context;
use reqwest::{StatusCode, Url};

/// A remote implementation using HTTP to interact with the hashstore service.
#[derive(Clone, Debug)]
pub struct HttpRemote {
    /// The base URL all request paths are appended to, without a trailing slash.
    base: String,
    /// The client shared by all virtual users, holding the connection pool.
    client: reqwest::Client,
}

impl HttpRemote {
    /// Creates a new `HttpRemote` for the given host with a default client.
    pub fn new(host: &str) -> anyhow::Result<Self> {
        Self::with_client(host, reqwest::Client::new())
    }

    /// Creates a new `HttpRemote` for the given host using a preconfigured client.
    pub fn with_client(host: &str, client: reqwest::Client) -> anyhow::Result<Self> {
        let url = Url::parse(host).with_context(|| format!("invalid host `{host}`"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("host `{host}` must use http or https");
        }

        Ok(Self {
            base: host.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// The configured base URL.
    pub fn host(&self) -> &str {
        &self.base
    }

    /// Issues a `GET` for `path` and returns the response status.
    ///
    /// The body is drained so the connection goes back into the pool, its contents are ignored.
    pub(crate) async fn get_status(&self, path: &str) -> Result<StatusCode, reqwest::Error> {
        let url = format!("{}{path}", self.base);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        response.bytes().await?;

        Ok(status)
    }
}

//! JSON request/response over HTTP.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::TransportError;
use crate::net::tls;

/// Pooled HTTP client bound to one named endpoint.
#[derive(Debug, Clone)]
pub struct JsonHttpClient {
    name: String,
    base_url: Url,
    client: reqwest::Client,
    connect_timeout: Duration,
}

impl JsonHttpClient {
    /// Build a client for `address`, trusting `tls_ca_path` if given.
    pub fn new(
        name: impl Into<String>,
        address: &str,
        connect_timeout: Duration,
        tls_ca_path: Option<&str>,
    ) -> Result<Self, TransportError> {
        let name = name.into();
        let base_url: Url = address.parse().map_err(|e| TransportError::Connect {
            endpoint: name.clone(),
            message: format!("invalid address '{}': {}", address, e),
        })?;

        let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
        if let Some(path) = tls_ca_path {
            let cert = tls::load_root_certificate(Path::new(path)).map_err(|e| {
                TransportError::Connect {
                    endpoint: name.clone(),
                    message: format!("CA certificate: {}", e),
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder.build().map_err(|e| TransportError::Connect {
            endpoint: name.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            name,
            base_url,
            client,
            connect_timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a path below the base address.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        joined.parse().map_err(|e| TransportError::Connect {
            endpoint: self.name.clone(),
            message: format!("invalid URL '{}': {}", joined, e),
        })
    }

    /// POST `body` as JSON to `path` and decode the JSON reply.
    pub async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url_for(path)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                endpoint: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Malformed {
            endpoint: self.name.clone(),
            message: e.to_string(),
        })
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: self.name.clone(),
                after: self.connect_timeout,
            }
        } else if err.is_decode() {
            TransportError::Malformed {
                endpoint: self.name.clone(),
                message: err.to_string(),
            }
        } else {
            TransportError::Connect {
                endpoint: self.name.clone(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_paths() {
        let client =
            JsonHttpClient::new("peer0", "http://127.0.0.1:7051/", Duration::from_secs(1), None)
                .unwrap();
        assert_eq!(
            client.url_for("/v1/proposals").unwrap().as_str(),
            "http://127.0.0.1:7051/v1/proposals"
        );

        let client =
            JsonHttpClient::new("peer1", "http://peer1:7051/base", Duration::from_secs(1), None)
                .unwrap();
        assert_eq!(
            client.url_for("v1/proposals").unwrap().as_str(),
            "http://peer1:7051/base/v1/proposals"
        );
    }

    #[test]
    fn test_invalid_address() {
        let err = JsonHttpClient::new("peer0", "not a url", Duration::from_secs(1), None)
            .unwrap_err();
        assert_eq!(err.endpoint(), "peer0");
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = JsonHttpClient::new(
            "peer0",
            &format!("http://{}", addr),
            Duration::from_secs(1),
            None,
        )
        .unwrap();
        let err = client
            .post::<_, serde_json::Value>("v1/proposals", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}

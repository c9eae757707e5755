//! REST API configuration fetcher.
//!
//! PAN-OS style exchange: a keygen request authenticates and yields a
//! short-lived API key, then an operational request returns the running
//! configuration as XML. The API reports failures inside an HTTP 200
//! body, so the payload shape is validated before it is trusted: a body
//! with no recognizable result node is a retrieval failure no matter what
//! the transport said.

use std::time::Duration;

use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};

use crate::config::RunConfig;
use crate::device::ApiSpec;
use crate::error::FetchError;
use crate::metrics::{self, RunMetrics};
use crate::scrape::ConfigDocument;

use super::ConfigFetcher;

/// Keygen request timeout.
const KEYGEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration retrieval timeout.
const RETRIEVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches a configuration through the device's XML API.
pub struct ApiFetcher {
    base_url: String,
    username: String,
    password: SecretString,
    retrieval_cmd: String,
    client: reqwest::Client,
}

impl ApiFetcher {
    /// Build a fetcher for this run.
    pub fn new(config: &RunConfig, spec: ApiSpec) -> Result<Self, FetchError> {
        let endpoint = config.device.endpoint(spec.default_port)?;

        let base_url = if endpoint.port == 443 {
            format!("https://{}", endpoint.host)
        } else {
            format!("https://{}:{}", endpoint.host, endpoint.port)
        };

        // Appliances ship self-signed certificates; verification is
        // opt-in via VERIFY_SSL.
        let client = reqwest::Client::builder()
            .timeout(RETRIEVE_TIMEOUT)
            .danger_accept_invalid_certs(!config.device.verify_tls)
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        Ok(Self {
            base_url,
            username: endpoint.username,
            password: endpoint.password,
            retrieval_cmd: spec.retrieval_cmd,
            client,
        })
    }

    /// Override the base URL (plain-HTTP test servers).
    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Authenticate and extract the short-lived API key.
    async fn keygen(&self) -> Result<String, FetchError> {
        let url = format!("{}/api/", self.base_url);
        debug!("requesting API key from {url}");

        let response = self
            .client
            .get(&url)
            .timeout(KEYGEN_TIMEOUT)
            .query(&[
                ("type", "keygen"),
                ("user", self.username.as_str()),
                ("password", self.password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Authentication {
                user: self.username.clone(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Connection(format!(
                "keygen returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;
        let doc = roxmltree::Document::parse(&body)
            .map_err(|e| FetchError::Protocol(format!("keygen response is not XML: {e}")))?;

        let key = doc
            .descendants()
            .find(|n| n.has_tag_name("key"))
            .and_then(|n| n.text())
            .filter(|k| !k.is_empty());

        match key {
            Some(key) => Ok(key.to_string()),
            None => {
                // The API answered but withheld a key; surface its own
                // message when it included one.
                let msg = doc
                    .descendants()
                    .find(|n| n.has_tag_name("msg"))
                    .and_then(|n| n.text())
                    .unwrap_or("API did not return a key");
                debug!("keygen rejected: {msg}");
                Err(FetchError::Authentication {
                    user: self.username.clone(),
                })
            }
        }
    }

    /// Request the running configuration with the given key.
    async fn retrieve(&self, api_key: &str) -> Result<ConfigDocument, FetchError> {
        let url = format!("{}/api/", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("type", "op"),
                ("cmd", self.retrieval_cmd.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Configuration(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Configuration(format!(
                "retrieval returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Configuration(e.to_string()))?;

        validate_payload(&body)?;
        Ok(ConfigDocument::from_payload(body))
    }
}

#[async_trait::async_trait]
impl ConfigFetcher for ApiFetcher {
    async fn fetch(&self, run_metrics: &mut RunMetrics) -> Result<ConfigDocument, FetchError> {
        info!("authenticating to {}", self.base_url);
        let api_key = self.keygen().await?;
        run_metrics.inc(&metrics::CONNECTION_SUCCESS_TOTAL, &[]);
        info!("authenticated to {}", self.base_url);

        let document = self.retrieve(&api_key).await?;
        info!("retrieved {} bytes of configuration", document.size_bytes());
        Ok(document)
    }
}

/// Check that a 200 body actually carries a configuration result.
///
/// The expected shape is a `<response>` envelope with a `<result>` inside;
/// an envelope with neither is the API's embedded error form.
fn validate_payload(body: &str) -> Result<(), FetchError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| FetchError::Configuration(format!("response is not XML: {e}")))?;

    let root = doc.root_element();
    let has_result = doc.descendants().any(|n| n.has_tag_name("result"));
    let has_nested_response = doc
        .descendants()
        .any(|n| n.has_tag_name("response") && n != root);

    if has_result || has_nested_response {
        Ok(())
    } else {
        Err(FetchError::Configuration(
            "response has no result node".to_string(),
        ))
    }
}

//! Interactive (screen-scrape) configuration fetcher.

use std::time::Duration;

use log::{debug, info, warn};

use crate::config::RunConfig;
use crate::device::{InteractiveSpec, PromptStyle};
use crate::error::{FetchError, TransportError};
use crate::metrics::{self, RunMetrics};
use crate::scrape::{ConfigDocument, NormalizePolicy, ScrapeEngine};
use crate::transport::{AuthMethod, SshConfig, SshSession};

use super::ConfigFetcher;

/// Per-receive chunk cap.
const MAX_CHUNK: usize = 65536;

/// Fetches a configuration by driving an interactive SSH session:
/// connect, run the profile's mode-setup commands, send the retrieval
/// command, and feed the scrape engine until the prompt returns. The
/// session is closed on every exit path; it is owned by this one attempt.
pub struct InteractiveFetcher {
    ssh: SshConfig,
    spec: InteractiveSpec,
    normalize: NormalizePolicy,
    completion_marker: String,
    scrape_deadline: Duration,
}

impl InteractiveFetcher {
    /// Build a fetcher for this run.
    ///
    /// Fails (classified, not fatal to the process) when the endpoint or
    /// the completion marker cannot be resolved from configuration.
    pub fn new(config: &RunConfig, spec: InteractiveSpec) -> Result<Self, FetchError> {
        let endpoint = config.device.endpoint(spec.default_port)?;
        let completion_marker = resolve_completion_marker(
            config.device.prompt_marker.as_deref(),
            config.device.device_name.as_deref(),
            &endpoint.username,
            spec.prompt_style,
        )?;

        let ssh = SshConfig {
            host: endpoint.host,
            port: endpoint.port,
            username: endpoint.username,
            auth: AuthMethod::Password(endpoint.password),
            timeout: config.connect_timeout,
            terminal_width: 511,
            terminal_height: 24,
        };

        Ok(Self {
            ssh,
            spec,
            normalize: config.profile.normalize,
            completion_marker,
            scrape_deadline: config.scrape_deadline,
        })
    }

    /// Drive setup, retrieval, and the scrape loop on an open session.
    ///
    /// Transport failures past this point are retrieval failures: the
    /// connection stage already succeeded and was counted. One deadline
    /// bounds the whole exchange, banner and setup drains included; a
    /// device that never goes quiet cannot hang the attempt.
    async fn scrape(&self, session: &mut SshSession) -> Result<ConfigDocument, FetchError> {
        let as_config_error =
            |e: TransportError| FetchError::Configuration(e.to_string());

        let deadline = tokio::time::Instant::now() + self.scrape_deadline;

        // Let the login banner drain before talking to the shell.
        self.drain_quiet(session, deadline).await?;

        for command in &self.spec.setup_commands {
            debug!("setup command: {command}");
            session.send(command).await.map_err(as_config_error)?;
            self.drain_quiet(session, deadline).await?;
        }

        info!("retrieval command: {}", self.spec.retrieval_command);
        session
            .send(&self.spec.retrieval_command)
            .await
            .map_err(as_config_error)?;

        let mut engine = ScrapeEngine::new(
            &self.completion_marker,
            self.spec.pagination_marker.as_deref(),
            self.normalize,
        );

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(FetchError::Timeout(self.scrape_deadline));
            }

            let Some(chunk) = session
                .receive(MAX_CHUNK, self.spec.poll_timeout)
                .await
                .map_err(as_config_error)?
            else {
                // Poll expired with nothing to read; the overall deadline
                // bounds how long we keep doing this.
                continue;
            };

            let outcome = engine.feed(&chunk);
            for _ in 0..outcome.continuations {
                session
                    .send_raw(self.spec.continuation.as_bytes())
                    .await
                    .map_err(as_config_error)?;
            }
            if outcome.finalized {
                break;
            }
        }

        engine
            .into_document()
            .ok_or_else(|| FetchError::Configuration("scrape ended without a document".into()))
    }

    /// Read until the session stays quiet for one settle interval, or the
    /// shared scrape deadline expires.
    async fn drain_quiet(
        &self,
        session: &mut SshSession,
        deadline: tokio::time::Instant,
    ) -> Result<(), FetchError> {
        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(FetchError::Timeout(self.scrape_deadline));
            }
            match session.receive(MAX_CHUNK, self.spec.settle).await {
                Ok(Some(_)) => continue,
                Ok(None) => return Ok(()),
                Err(e) => return Err(FetchError::Configuration(e.to_string())),
            }
        }
    }
}

#[async_trait::async_trait]
impl ConfigFetcher for InteractiveFetcher {
    async fn fetch(&self, run_metrics: &mut RunMetrics) -> Result<ConfigDocument, FetchError> {
        info!("connecting to {}:{}", self.ssh.host, self.ssh.port);

        let mut session = SshSession::connect(self.ssh.clone())
            .await
            .map_err(FetchError::from)?;
        run_metrics.inc(&metrics::CONNECTION_SUCCESS_TOTAL, &[]);
        info!("connected to {}", self.ssh.host);

        let result = self.scrape(&mut session).await;

        // Close on every path; a close failure never overwrites the
        // first classified error.
        if let Err(e) = session.close().await {
            warn!("error closing session: {e}");
        }

        result
    }
}

/// Resolve the literal completion marker for this run.
fn resolve_completion_marker(
    override_marker: Option<&str>,
    device_name: Option<&str>,
    username: &str,
    style: PromptStyle,
) -> Result<String, FetchError> {
    if let Some(marker) = override_marker {
        return Ok(marker.to_string());
    }
    let Some(device_name) = device_name else {
        return Err(FetchError::Configuration(
            "PROMPT_MARKER or DEVICE_NAME must be set".to_string(),
        ));
    };
    Ok(match style {
        PromptStyle::DeviceName => device_name.to_string(),
        PromptStyle::UserAndDeviceName => format!("{username}{device_name}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_marker_override_wins() {
        let marker = resolve_completion_marker(
            Some("FGT-01 #"),
            Some("ignored"),
            "admin",
            PromptStyle::DeviceName,
        )
        .unwrap();
        assert_eq!(marker, "FGT-01 #");
    }

    #[test]
    fn test_completion_marker_from_device_name() {
        let marker =
            resolve_completion_marker(None, Some("FGT-01"), "admin", PromptStyle::DeviceName)
                .unwrap();
        assert_eq!(marker, "FGT-01");
    }

    #[test]
    fn test_completion_marker_user_and_device() {
        let marker = resolve_completion_marker(
            None,
            Some("@sw-core>"),
            "netops",
            PromptStyle::UserAndDeviceName,
        )
        .unwrap();
        assert_eq!(marker, "netops@sw-core>");
    }

    #[test]
    fn test_completion_marker_requires_configuration() {
        let err = resolve_completion_marker(None, None, "admin", PromptStyle::DeviceName)
            .unwrap_err();
        assert_eq!(err.error_type(), "configuration_error");
    }
}

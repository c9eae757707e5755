//! SSH session implementation using russh.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use log::{debug, trace};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, SshConfig};
use crate::error::TransportError;

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Lifecycle state of one SSH session.
///
/// Transitions are strictly forward; a session is never reused after
/// `Closed`. One session is owned by exactly one fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// TCP + SSH handshake in progress.
    Connecting,
    /// Authentication accepted, shell channel open.
    Authenticated,
    /// At least one command has been sent.
    Streaming,
    /// Session torn down.
    Closed,
}

/// Interactive SSH session over a PTY shell channel.
///
/// Wraps a russh client handle plus a single shell channel and exposes the
/// send / polled-receive primitives the scrape loop is built on. There is
/// no automatic reconnection: callers open one session per attempt and
/// always close it, success or not.
pub struct SshSession {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// The interactive shell channel.
    channel: Channel<Msg>,

    /// Configuration used for this connection.
    config: SshConfig,

    /// Forward-only lifecycle state.
    state: SessionState,

    /// Bytes received but not yet handed to the caller (a device message
    /// larger than the caller's `max_bytes` is split across receives).
    leftover: BytesMut,
}

impl SshSession {
    /// Connect to the device, authenticate, and open the shell channel.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        debug!("connecting to {}", config.socket_addr());

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let handler = SshHandler;

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        Self::authenticate(&mut session, &config).await?;

        // Open the PTY shell channel up front; the session is only useful
        // for interactive scraping.
        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "xterm",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("authenticated as '{}', shell channel open", config.username);

        Ok(Self {
            session,
            channel,
            config,
            state: SessionState::Authenticated,
            leftover: BytesMut::new(),
        })
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                // Get the best RSA hash algorithm supported by the server
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            });
        }

        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Send a command line (a trailing newline is appended).
    pub async fn send(&mut self, command: &str) -> Result<()> {
        trace!("send: {:?}", command);
        let mut line = command.as_bytes().to_vec();
        line.push(b'\n');
        self.send_raw(&line).await
    }

    /// Send raw bytes without a newline (continuation keystrokes).
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(TransportError::Disconnected);
        }
        self.channel
            .data(data)
            .await
            .map_err(TransportError::Ssh)?;
        self.advance(SessionState::Streaming);
        Ok(())
    }

    /// Poll for a chunk of device output.
    ///
    /// Returns `Ok(None)` if nothing arrived within `poll_timeout`. A chunk
    /// larger than `max_bytes` is split; the remainder is returned by
    /// subsequent calls. Channel EOF or close is a transport error: the
    /// scrape loop decides completion, not the peer.
    pub async fn receive(
        &mut self,
        max_bytes: usize,
        poll_timeout: Duration,
    ) -> Result<Option<Bytes>> {
        if !self.leftover.is_empty() {
            return Ok(Some(self.take_leftover(max_bytes)));
        }

        let deadline = tokio::time::Instant::now() + poll_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let msg = match tokio::time::timeout(remaining, self.channel.wait()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(TransportError::Disconnected),
                Ok(Some(msg)) => msg,
            };

            match msg {
                ChannelMsg::Data { data } => {
                    trace!("recv: {} bytes", data.len());
                    self.leftover.extend_from_slice(&data);
                    return Ok(Some(self.take_leftover(max_bytes)));
                }
                ChannelMsg::ExtendedData { data, .. } => {
                    trace!("recv (stderr): {} bytes", data.len());
                    self.leftover.extend_from_slice(&data);
                    return Ok(Some(self.take_leftover(max_bytes)));
                }
                ChannelMsg::Eof | ChannelMsg::Close => {
                    return Err(TransportError::Disconnected);
                }
                // Window adjusts, exit status and the like carry no output.
                _ => continue,
            }
        }
    }

    /// Close the channel and disconnect.
    pub async fn close(mut self) -> Result<()> {
        self.advance(SessionState::Closed);
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    fn take_leftover(&mut self, max_bytes: usize) -> Bytes {
        let n = self.leftover.len().min(max_bytes);
        self.leftover.split_to(n).freeze()
    }

    fn advance(&mut self, next: SessionState) {
        // States only move forward; a stale transition is a no-op.
        if next > self.state {
            self.state = next;
        }
    }
}

/// SSH client handler for russh.
///
/// Host keys are accepted without verification: backup targets are
/// appliances on a management network and the key store is not persistent
/// in the container this runs in.
struct SshHandler;

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

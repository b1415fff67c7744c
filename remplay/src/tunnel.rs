//! Public tunnel publishing
//!
//! Launches the ngrok agent for the HTTP port and asks the agent's local
//! inspection API for the public URL it was assigned. The agent process is
//! owned by the returned [`PublicTunnel`] and dies with it.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use remplay_common::CommandTemplate;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// ngrok agent inspection endpoint
pub const DEFAULT_AGENT_API: &str = "http://127.0.0.1:4040/api/tunnels";

/// Tunnel errors
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The agent binary could not be started
    #[error("Failed to start tunnel agent '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The agent exited before publishing a tunnel
    #[error("Tunnel agent exited early ({0})")]
    AgentExited(String),

    /// No tunnel appeared after polling the agent API
    #[error("No public tunnel after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    /// Waiting on the agent process failed
    #[error("Tunnel agent I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A published tunnel
///
/// Dropping it terminates the agent.
#[derive(Debug)]
pub struct PublicTunnel {
    pub public_url: String,
    _agent: Child,
}

/// Obtains a public URL for a local port
#[async_trait]
pub trait TunnelPublisher: Send + Sync {
    async fn connect(&self, local_port: u16) -> Result<PublicTunnel, TunnelError>;
}

/// Agent API response (`GET /api/tunnels`)
#[derive(Debug, Deserialize)]
struct TunnelList {
    tunnels: Vec<TunnelInfo>,
}

#[derive(Debug, Deserialize)]
struct TunnelInfo {
    public_url: String,
    #[serde(default)]
    proto: String,
}

/// [`TunnelPublisher`] that drives the ngrok agent
pub struct NgrokTunnel {
    command: CommandTemplate,
    api_url: String,
    attempts: u32,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl NgrokTunnel {
    /// `command` is rendered with `{port}` set to the local port
    pub fn new(command: CommandTemplate) -> Self {
        Self {
            command,
            api_url: DEFAULT_AGENT_API.to_string(),
            attempts: 20,
            poll_interval: Duration::from_millis(500),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_polling(mut self, attempts: u32, poll_interval: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.poll_interval = poll_interval;
        self
    }

    async fn fetch_public_url(&self) -> Result<Option<String>, reqwest::Error> {
        let list: TunnelList = self
            .client
            .get(&self.api_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(select_public_url(&list))
    }
}

/// Prefer the https endpoint when the agent reports both schemes
fn select_public_url(list: &TunnelList) -> Option<String> {
    list.tunnels
        .iter()
        .find(|t| t.proto == "https")
        .or_else(|| list.tunnels.first())
        .map(|t| t.public_url.clone())
}

#[async_trait]
impl TunnelPublisher for NgrokTunnel {
    async fn connect(&self, local_port: u16) -> Result<PublicTunnel, TunnelError> {
        let port_arg = local_port.to_string();
        let invocation = self.command.render(&[("port", port_arg.as_str())]);
        info!(command = %invocation, "Starting tunnel agent");

        let mut agent = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TunnelError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let mut last_error = String::from("agent API not reachable");
        for attempt in 1..=self.attempts {
            if let Some(status) = agent.try_wait()? {
                return Err(TunnelError::AgentExited(status.to_string()));
            }

            match self.fetch_public_url().await {
                Ok(Some(public_url)) => {
                    return Ok(PublicTunnel {
                        public_url,
                        _agent: agent,
                    });
                }
                Ok(None) => last_error = "agent reports no tunnels".to_string(),
                Err(e) => last_error = e.to_string(),
            }

            debug!(attempt, error = %last_error, "Tunnel not ready yet");
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(TunnelError::Unavailable {
            attempts: self.attempts,
            last_error,
        })
    }
}

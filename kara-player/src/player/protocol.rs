//! Player remote-control protocol
//!
//! VLC's HTTP interface: every request is a GET on `/requests/status.xml`,
//! authenticated with an empty username and the per-process password. Without
//! a `command` parameter it returns the status document; with one it runs the
//! command and returns the status as it was before the command took effect.

use crate::error::{Error, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Length of the generated control credential
pub const CREDENTIAL_LEN: usize = 32;

/// Generate a fresh random control credential
pub fn generate_credential() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CREDENTIAL_LEN)
        .map(char::from)
        .collect()
}

/// Playback state field of the status document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
    /// Anything else the player reports
    Unknown,
}

impl From<&str> for PlayerState {
    fn from(value: &str) -> Self {
        match value.trim() {
            "stopped" => PlayerState::Stopped,
            "playing" => PlayerState::Playing,
            "paused" => PlayerState::Paused,
            _ => PlayerState::Unknown,
        }
    }
}

/// Parsed player status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlayerStatus {
    pub state: PlayerState,
    pub volume: i64,
    /// Elapsed seconds
    pub time: i64,
    /// Total seconds (0 when unknown)
    pub length: i64,
}

impl PlayerStatus {
    /// Fraction of the track already played, None when length is unknown
    pub fn progress(&self) -> Option<f64> {
        if self.length > 0 {
            Some(self.time as f64 / self.length as f64)
        } else {
            None
        }
    }
}

/// Raw document, only the fields we read
#[derive(Debug, Deserialize)]
struct StatusDocument {
    state: String,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    length: Option<String>,
}

fn parse_number(field: &str, value: Option<String>) -> Result<i64> {
    match value {
        None => Ok(0),
        Some(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(0);
            }
            // Some builds report volume as a float
            text.parse::<i64>()
                .or_else(|_| text.parse::<f64>().map(|v| v.round() as i64))
                .map_err(|_| Error::StatusParse(format!("{} is not a number: {:?}", field, text)))
        }
    }
}

/// Parse a status document
pub fn parse_status(xml: &str) -> Result<PlayerStatus> {
    let doc: StatusDocument =
        quick_xml::de::from_str(xml).map_err(|e| Error::StatusParse(e.to_string()))?;

    Ok(PlayerStatus {
        state: PlayerState::from(doc.state.as_str()),
        volume: parse_number("volume", doc.volume)?,
        time: parse_number("time", doc.time)?,
        length: parse_number("length", doc.length)?,
    })
}

/// Remote-control commands understood by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// `pl_pause` (toggles pause)
    Pause,
    /// `pl_play`
    Play,
    /// `pl_stop`
    Stop,
    /// `pl_next`
    Next,
    /// `seek&val=N` (absolute seconds)
    Seek(i64),
    /// `volume&val=N` (absolute)
    Volume(i64),
    /// `in_enqueue&input=PATH`
    Enqueue(PathBuf),
}

impl PlayerCommand {
    /// Command name sent in the `command` parameter
    pub fn name(&self) -> &'static str {
        match self {
            PlayerCommand::Pause => "pl_pause",
            PlayerCommand::Play => "pl_play",
            PlayerCommand::Stop => "pl_stop",
            PlayerCommand::Next => "pl_next",
            PlayerCommand::Seek(_) => "seek",
            PlayerCommand::Volume(_) => "volume",
            PlayerCommand::Enqueue(_) => "in_enqueue",
        }
    }

    /// Full query parameter list
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("command", self.name().to_string())];
        match self {
            PlayerCommand::Seek(val) | PlayerCommand::Volume(val) => {
                params.push(("val", val.to_string()));
            }
            PlayerCommand::Enqueue(path) => {
                params.push(("input", path.to_string_lossy().into_owned()));
            }
            _ => {}
        }
        params
    }
}

/// Authenticated channel to one player process's control server
///
/// Cheap to clone; the credential is only valid for the process it was
/// launched with.
#[derive(Clone)]
pub struct ControlChannel {
    http: reqwest::Client,
    status_url: String,
    credential: String,
}

impl ControlChannel {
    /// Channel to the control server on `localhost:port`
    pub fn new(port: u16, credential: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(&format!("http://127.0.0.1:{}", port), credential, timeout)
    }

    /// Channel to a control server at an arbitrary base URL
    pub fn with_base_url(base_url: &str, credential: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            status_url: format!("{}/requests/status.xml", base_url.trim_end_matches('/')),
            credential,
        })
    }

    /// Credential this channel authenticates with
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Query the status document
    pub async fn status(&self) -> Result<PlayerStatus> {
        let body = self
            .http
            .get(&self.status_url)
            .basic_auth("", Some(&self.credential))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_status(&body)
    }

    /// Send one command
    pub async fn send(&self, command: &PlayerCommand) -> Result<()> {
        debug!(command = command.name(), "Sending player command");
        self.http
            .get(&self.status_url)
            .basic_auth("", Some(&self.credential))
            .query(&command.query())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

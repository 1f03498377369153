//! SoWasm session orchestration
//!
//! This crate provides:
//! - A keyed debounce scheduler driven by the tokio clock
//! - Format guessing and conversion pipelines over pluggable Detector/Converter backends
//! - Remote document loading over HTTP, optionally through a CORS proxy
//! - Permalink encoding/decoding of the whole session
//! - The session controller sequencing all of the above

pub mod controller;
pub mod diagnostics;
pub mod editor;
pub mod formats;
pub mod loader;
pub mod permalink;
pub mod pipeline;
pub mod scheduler;
pub mod state;


pub use controller::{Collaborators, SessionController, SessionEvent};
pub use diagnostics::{ErrorDiagnostic, SessionError};
pub use loader::{HttpTransport, RemoteLoader, Transport};
pub use pipeline::{ConvertPipeline, Converter, Detector, GuessPipeline};
pub use scheduler::Scheduler;
pub use state::{FormatMode, OutputRegion, SessionState};

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading a [`SessionConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a session
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SessionConfig {
    /// Quiet period before a format guess runs (ms)
    #[serde(default = "default_guess_delay_ms")]
    pub guess_delay_ms: u64,

    /// Quiet period before an automatic conversion runs (ms)
    #[serde(default = "default_convert_delay_ms")]
    pub convert_delay_ms: u64,

    /// Proxy endpoint; the percent-encoded target URL is appended to it
    #[serde(default = "default_cors_proxy")]
    pub cors_proxy: String,

    /// Canonical URL of the application.
    ///
    /// Permalinks are built on it, and it is sent as user-agent through the proxy.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,

    /// Base IRI handed to the converter when no remote URL is set
    #[serde(default = "default_base_iri")]
    pub default_base_iri: String,
}

fn default_guess_delay_ms() -> u64 { 500 }
fn default_convert_delay_ms() -> u64 { 500 }
fn default_cors_proxy() -> String { "https://corsproxy.io/?".to_string() }
fn default_app_base_url() -> String { "https://pchampin.github.io/sowasm/".to_string() }
fn default_base_iri() -> String { "x-string:///".to_string() }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            guess_delay_ms: default_guess_delay_ms(),
            convert_delay_ms: default_convert_delay_ms(),
            cors_proxy: default_cors_proxy(),
            app_base_url: default_app_base_url(),
            default_base_iri: default_base_iri(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from TOML text; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn guess_delay(&self) -> Duration {
        Duration::from_millis(self.guess_delay_ms)
    }

    pub fn convert_delay(&self) -> Duration {
        Duration::from_millis(self.convert_delay_ms)
    }
}

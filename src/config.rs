//! Environment-driven configuration for the server and the launcher
//!
//! Both binaries read their settings once at startup. Values that are
//! missing or fail to parse fall back to the defaults below.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Subject used when an `/ask` request does not name one
pub const DEFAULT_SUBJECT: &str = "introduction_to_database";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATA_PATH: &str = "data/sample_content.json";
const DEFAULT_UI_DIR: &str = "ui";
const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Name of the server executable the launcher looks for next to itself
pub const SERVER_BIN_NAME: &str = "adaptlearn-chatbot";

/// Configuration for the web front door
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Rule table file, read at startup and on reload
    pub data_path: PathBuf,
    /// Filesystem fallback for the page and static assets
    pub ui_dir: PathBuf,
    pub default_subject: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            ui_dir: PathBuf::from(DEFAULT_UI_DIR),
            default_subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: var("ADAPTLEARN_HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),
            port: parse_port(var("ADAPTLEARN_PORT")),
            data_path: var("ADAPTLEARN_DATA_PATH").map_or(defaults.data_path, PathBuf::from),
            ui_dir: var("ADAPTLEARN_UI_DIR").map_or(defaults.ui_dir, PathBuf::from),
            default_subject: var("ADAPTLEARN_DEFAULT_SUBJECT")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.default_subject),
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Configuration for the launcher binary
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Server executable to spawn
    pub server_bin: PathBuf,
    /// Page the browser is pointed at
    pub url: String,
    /// Browser opener override; `None` uses the platform default
    pub browser: Option<String>,
    /// Time allowed between SIGTERM and SIGKILL
    pub grace: Duration,
}

impl LauncherConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_port(var("ADAPTLEARN_PORT"));
        let server_bin = var("ADAPTLEARN_SERVER_BIN").map_or_else(sibling_server_bin, PathBuf::from);
        let grace = var("ADAPTLEARN_GRACE_SECS")
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_GRACE, Duration::from_secs);

        Self {
            server_bin,
            url: format!("http://127.0.0.1:{port}/"),
            browser: var("ADAPTLEARN_BROWSER").filter(|s| !s.is_empty()),
            grace,
        }
    }
}

fn parse_port(value: Option<String>) -> u16 {
    value.and_then(|p| p.parse().ok()).unwrap_or(DEFAULT_PORT)
}

/// The server binary installed alongside the running executable
fn sibling_server_bin() -> PathBuf {
    let name = format!("{SERVER_BIN_NAME}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

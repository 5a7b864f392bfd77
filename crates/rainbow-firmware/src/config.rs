use tracing::warn;
use url::Url;

/// Default remote game server.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:3000";
/// Default admin HTTP port.
pub const DEFAULT_ADMIN_PORT: u16 = 8080;

/// Runtime knobs for a booted chip.
#[derive(Clone, Debug)]
pub struct FirmwareConfig {
    pub(crate) server_url: String,
    pub(crate) admin_port: Option<u16>,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self { server_url: DEFAULT_SERVER_URL.to_owned(), admin_port: Some(DEFAULT_ADMIN_PORT) }
    }
}

impl FirmwareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// WebSocket URL of the remote game server. Only plain `ws://`
    /// endpoints are supported: the link is driven by non-blocking poll
    /// ticks, which the TLS transports do not offer. Anything else is kept
    /// but flagged; the dial itself reports the definitive failure.
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        match Url::parse(&server_url) {
            Ok(url) if url.scheme() == "ws" => {}
            Ok(url) => {
                warn!(scheme = url.scheme(), "only plain ws:// server links are supported");
            }
            Err(err) => warn!(%err, "server url does not parse"),
        }
        self.server_url = server_url;
        self
    }

    /// TCP port of the admin HTTP surface. Port 0 binds an ephemeral port.
    pub fn with_admin_port(mut self, port: u16) -> Self {
        self.admin_port = Some(port);
        self
    }

    /// Run without the admin HTTP surface.
    pub fn without_admin(mut self) -> Self {
        self.admin_port = None;
        self
    }
}

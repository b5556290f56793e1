use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::email::providers::{DefaultProviders, ProviderInfo};
use crate::email::sender::Sender;
use crate::email::smtp::SmtpTransportFactory;
use crate::server::Server;

/// Server settings, usually read from a TOML file:
///
/// ```toml
/// provider = "yandex"            # or { host = "mail.example.com", port = 587 }
/// timeout_secs = 30
///
/// [sender]
/// email = "bot@example.com"
/// secret = "app-password"
/// display_name = "Robot"         # defaults to "noreply"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub sender: SenderConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    pub email: String,
    pub secret: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

/// Either a preset name or an explicit host/port pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Preset(String),
    Custom { host: String, port: u16 },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Preset("gmail".to_string())
    }
}

fn default_display_name() -> String {
    "noreply".to_string()
}

impl ProviderConfig {
    pub fn resolve(&self) -> Result<ProviderInfo> {
        match self {
            ProviderConfig::Preset(name) => DefaultProviders::by_name(name)
                .ok_or_else(|| anyhow!("Unknown SMTP provider preset '{}'", name)),
            ProviderConfig::Custom { host, port } => Ok(ProviderInfo::new(host.clone(), *port)),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse server config")?;
        config.provider.resolve()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&source)
    }

    pub fn sender(&self) -> Sender {
        Sender::new(self.sender.email.clone(), self.sender.secret.clone())
            .with_display_name(self.sender.display_name.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Server {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let provider = config.provider.resolve()?;
        let mut transport = SmtpTransportFactory::new();
        if let Some(timeout) = config.timeout() {
            transport = transport.with_timeout(timeout);
        }

        tracing::debug!(
            "SMTP server for {} via {}:{}",
            config.sender.email,
            provider.host(),
            provider.port()
        );
        Ok(Server::with_provider(config.sender(), provider).with_transport(transport))
    }
}

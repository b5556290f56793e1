/// Address of an SMTP server.
///
/// The port is a `u16`, so it always lies in 0..=65535.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderInfo {
    host: String,
    port: u16,
}

impl ProviderInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ProviderInfo {
    fn default() -> Self {
        DefaultProviders::gmail()
    }
}

/// Built-in provider presets.
pub struct DefaultProviders;

impl DefaultProviders {
    pub const GMAIL_HOST: &'static str = "smtp.gmail.com";
    pub const GMAIL_PORT: u16 = 587;
    pub const YANDEX_HOST: &'static str = "smtp.yandex.ru";
    pub const YANDEX_PORT: u16 = 465;

    /// Gmail, including custom Google Workspace domains (STARTTLS on 587)
    pub fn gmail() -> ProviderInfo {
        ProviderInfo::new(Self::GMAIL_HOST, Self::GMAIL_PORT)
    }

    /// Yandex (implicit TLS on 465)
    pub fn yandex() -> ProviderInfo {
        ProviderInfo::new(Self::YANDEX_HOST, Self::YANDEX_PORT)
    }

    /// Looks a preset up by case-insensitive name.
    pub fn by_name(name: &str) -> Option<ProviderInfo> {
        match name.to_ascii_lowercase().as_str() {
            "gmail" => Some(Self::gmail()),
            "yandex" => Some(Self::yandex()),
            _ => None,
        }
    }
}

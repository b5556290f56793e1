use async_trait::async_trait;

use super::envelope::Envelope;
use crate::error::TransportError;

/// How the connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityMode {
    /// Implicit TLS on port 465, otherwise STARTTLS when the server offers it
    #[default]
    Auto,
    /// TLS from the first byte (SMTPS)
    ImplicitTls,
    /// Plain connection upgraded with STARTTLS; fails if the server cannot
    StartTls,
    /// No encryption at all
    None,
}

/// Port on which `SecurityMode::Auto` expects implicit TLS.
pub const SMTPS_PORT: u16 = 465;

/// One SMTP session. Steps are called in order:
/// connect, authenticate, send, disconnect.
#[async_trait]
pub trait Transport: Send {
    async fn connect(
        &mut self,
        host: &str,
        port: u16,
        security: SecurityMode,
    ) -> Result<(), TransportError>;

    async fn authenticate(&mut self, user: &str, secret: &str) -> Result<(), TransportError>;

    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError>;

    /// `quit` asks for a clean QUIT, otherwise the connection is just dropped.
    async fn disconnect(&mut self, quit: bool) -> Result<(), TransportError>;
}

/// Hands out a fresh, unconnected transport for every delivery.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transport>;
}

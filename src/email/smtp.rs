use std::time::Duration;

use async_trait::async_trait;
use lettre::address::Envelope as SmtpEnvelope;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;

use super::envelope::Envelope;
use super::transport::{SecurityMode, Transport, TransportFactory, SMTPS_PORT};
use crate::error::TransportError;

const AUTH_MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

/// SMTP session over tokio, TLS via rustls.
pub struct SmtpTransport {
    timeout: Option<Duration>,
    connection: Option<AsyncSmtpConnection>,
}

impl SmtpTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            connection: None,
        }
    }

    fn connection(&mut self) -> Result<&mut AsyncSmtpConnection, TransportError> {
        self.connection
            .as_mut()
            .ok_or_else(|| TransportError::Connection("not connected".to_string()))
    }
}

fn tls_parameters(host: &str) -> Result<TlsParameters, TransportError> {
    TlsParameters::new(host.to_string()).map_err(|e| TransportError::Connection(e.to_string()))
}

fn parse_address(email: &str) -> Result<Address, TransportError> {
    email
        .parse::<Address>()
        .map_err(|e| TransportError::Transfer(format!("invalid address '{}': {}", email, e)))
}

fn smtp_envelope(envelope: &Envelope) -> Result<SmtpEnvelope, TransportError> {
    let from = parse_address(&envelope.from.email)?;
    let to = envelope
        .recipients()
        .map(parse_address)
        .collect::<Result<Vec<_>, _>>()?;
    SmtpEnvelope::new(Some(from), to).map_err(|e| TransportError::Transfer(e.to_string()))
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn connect(
        &mut self,
        host: &str,
        port: u16,
        security: SecurityMode,
    ) -> Result<(), TransportError> {
        let implicit_tls = match security {
            SecurityMode::ImplicitTls => true,
            SecurityMode::Auto => port == SMTPS_PORT,
            SecurityMode::StartTls | SecurityMode::None => false,
        };

        let hello = ClientId::default();
        let tls = if implicit_tls {
            Some(tls_parameters(host)?)
        } else {
            None
        };

        tracing::debug!("Connecting to SMTP {}:{} ({:?})", host, port, security);
        let mut connection =
            AsyncSmtpConnection::connect_tokio1((host, port), self.timeout, &hello, tls, None)
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;

        let upgrade = match security {
            SecurityMode::StartTls => {
                if !connection.can_starttls() {
                    return Err(TransportError::Connection(
                        "server does not offer STARTTLS".to_string(),
                    ));
                }
                true
            }
            SecurityMode::Auto => !implicit_tls && connection.can_starttls(),
            SecurityMode::ImplicitTls | SecurityMode::None => false,
        };

        if upgrade {
            tracing::debug!("Upgrading connection with STARTTLS");
            connection
                .starttls(tls_parameters(host)?, &hello)
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
        }

        self.connection = Some(connection);
        Ok(())
    }

    async fn authenticate(&mut self, user: &str, secret: &str) -> Result<(), TransportError> {
        let credentials = Credentials::new(user.to_string(), secret.to_string());
        self.connection()?
            .auth(AUTH_MECHANISMS, &credentials)
            .await
            .map_err(|e| TransportError::Authentication(e.to_string()))?;
        Ok(())
    }

    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let smtp_envelope = smtp_envelope(envelope)?;
        let raw = envelope
            .to_mime()
            .map_err(|e| TransportError::Transfer(format!("failed to render message: {}", e)))?;

        self.connection()?
            .send(&smtp_envelope, &raw)
            .await
            .map_err(|e| TransportError::Transfer(e.to_string()))?;
        Ok(())
    }

    async fn disconnect(&mut self, quit: bool) -> Result<(), TransportError> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        if quit {
            connection
                .quit()
                .await
                .map_err(|e| TransportError::Transfer(e.to_string()))?;
        } else {
            connection.abort().await;
        }
        Ok(())
    }
}

/// Creates `SmtpTransport` sessions.
#[derive(Debug, Clone, Default)]
pub struct SmtpTransportFactory {
    timeout: Option<Duration>,
}

impl SmtpTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-command network timeout. None by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl TransportFactory for SmtpTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(SmtpTransport::new(self.timeout))
    }
}

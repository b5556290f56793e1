use thiserror::Error;

/// Failure while assembling the envelope, before any network step.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to read attachment '{name}': {source}")]
    Attachment {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure raised by a transport step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("authentication rejected: {0}")]
    Authentication(String),
    #[error("transfer failed: {0}")]
    Transfer(String),
}

/// Why a delivery did not happen.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("authentication rejected: {0}")]
    Authentication(String),
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("delivery cancelled")]
    Cancelled,
}

impl From<TransportError> for SendError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(m) => SendError::Connection(m),
            TransportError::Authentication(m) => SendError::Authentication(m),
            TransportError::Transfer(m) => SendError::Transfer(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mapping() {
        let err: SendError = TransportError::Authentication("535 bad credentials".into()).into();
        assert!(matches!(err, SendError::Authentication(ref m) if m == "535 bad credentials"));
        assert_eq!(err.to_string(), "authentication rejected: 535 bad credentials");
    }

    #[test]
    fn test_envelope_error_message() {
        let err = EnvelopeError::Attachment {
            name: "report.pdf".into(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"),
        };
        assert_eq!(err.to_string(), "failed to read attachment 'report.pdf': truncated");
    }
}

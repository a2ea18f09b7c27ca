//! Error types for certificate loading and metric publishing.
//!
//! Label derivation and [`observe`](crate::observe) cannot fail. Errors only come
//! from the pieces around them: decoding certificates, registering the gauge and
//! exporting the registry.

use std::fmt;
use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CertMetricsError>;

#[derive(Debug)]
pub enum CertMetricsError {
    /// A serial number that is not a decimal integer
    InvalidSerial {
        /// The rejected input
        value: String,
    },

    /// Certificate decoding or extension parsing failed
    CertificateError {
        /// Description of what went wrong
        reason: String,
    },

    /// The input held no certificate at all
    NoCertificates {
        /// Where the input came from (file path or "input")
        origin: String,
    },

    /// OpenSSL error occurred
    OpenSSLError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// The metrics registry rejected a collector
    Registry {
        /// The underlying prometheus error
        details: String,
    },

    /// Pushing to a Pushgateway failed
    Push {
        /// Gateway address
        address: String,
        /// The underlying prometheus error
        details: String,
    },

    /// Text exposition could not be produced
    Encoding {
        /// The underlying error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl fmt::Display for CertMetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSerial { value } => {
                write!(f, "Invalid serial number '{}': expected a decimal integer", value)
            }
            Self::CertificateError { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::NoCertificates { origin } => {
                write!(f, "No certificate found in {}", origin)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::Registry { details } => {
                write!(f, "Metrics registry error: {}", details)
            }
            Self::Push { address, details } => {
                write!(f, "Failed to push metrics to {}: {}", address, details)
            }
            Self::Encoding { details } => {
                write!(f, "Failed to encode metrics: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
        }
    }
}

impl std::error::Error for CertMetricsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for CertMetricsError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<openssl::error::ErrorStack> for CertMetricsError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}

impl From<prometheus::Error> for CertMetricsError {
    fn from(e: prometheus::Error) -> Self {
        Self::Registry {
            details: e.to_string(),
        }
    }
}

impl From<x509_parser::error::X509Error> for CertMetricsError {
    fn from(e: x509_parser::error::X509Error) -> Self {
        Self::CertificateError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CertMetricsError::NoCertificates {
            origin: "bundle.pem".to_string(),
        };
        assert_eq!(err.to_string(), "No certificate found in bundle.pem");

        let err = CertMetricsError::Push {
            address: "http://localhost:9091".to_string(),
            details: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to push metrics to http://localhost:9091: connection refused"
        );
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err: CertMetricsError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}

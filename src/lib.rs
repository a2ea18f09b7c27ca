//! Certificate expiration metrics.
//!
//! Derives a fixed label set from X.509 certificate metadata and records each
//! certificate's expiration instant (Unix seconds) into a gauge series keyed by
//! those labels. The gauge lives in an external metrics registry; this crate only
//! writes into it through an [`ExpirationSink`].
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, UNIX_EPOCH};
//! use certmetrics::{observe, CertificateRecord, ExtKeyUsage, PrometheusSink, SerialNumber};
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let sink = PrometheusSink::new(&registry)?;
//!
//! let cert = CertificateRecord::new(
//!     SerialNumber::from(12345u64),
//!     UNIX_EPOCH + Duration::from_secs(1_893_456_000),
//! )
//! .with_common_name("example.com")
//! .with_dns_names(vec!["b.example.com".to_string(), "a.example.com".to_string()])
//! .with_ext_key_usages(vec![ExtKeyUsage::ServerAuth]);
//!
//! observe(&sink, &[cert]);
//!
//! let value = sink
//!     .gauge()
//!     .with_label_values(&["12345", "example.com", "a.example.com,b.example.com", "0", "1", "0"])
//!     .get();
//! assert_eq!(value, 1_893_456_000.0);
//! # Ok::<(), certmetrics::CertMetricsError>(())
//! ```

use openssl::bn::{BigNum, BigNumRef};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub mod config;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod x509;

pub use error::{CertMetricsError, Result};
pub use labels::{LabelTuple, LABEL_NAMES};
pub use metrics::prom::{encode_text, push, PrometheusSink, PushTarget};
pub use metrics::ExpirationSink;

/// Name of the gauge series every observation is written to.
pub const METRIC_NAME: &str = "certificate_expiration_timestamp_seconds";

/// Help text of the gauge series.
pub const METRIC_HELP: &str = "Expiration times of certificates";

/// Certificate serial number.
///
/// Serial numbers are arbitrary-precision integers, unique only per issuing CA.
/// The value is kept in canonical decimal form, which is all the label set needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Parses a decimal integer, with an optional leading `-`.
    ///
    /// Leading zeros are dropped and `-0` normalizes to `0`.
    pub fn from_dec_str(s: &str) -> Result<Self> {
        let invalid = || CertMetricsError::InvalidSerial {
            value: s.to_string(),
        };
        // BN_dec2bn stops at the first non-digit instead of failing.
        let digits = s.strip_prefix('-').unwrap_or(s);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let bn = BigNum::from_dec_str(s).map_err(|_| invalid())?;
        SerialNumber::from_bn(&bn)
    }

    /// Converts an OpenSSL big number.
    pub fn from_bn(bn: &BigNumRef) -> Result<Self> {
        Ok(SerialNumber(bn.to_dec_str()?.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for SerialNumber {
    fn from(value: u64) -> Self {
        SerialNumber(value.to_string())
    }
}

impl From<i64> for SerialNumber {
    fn from(value: i64) -> Self {
        SerialNumber(value.to_string())
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extended key usage purposes of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtKeyUsage {
    /// anyExtendedKeyUsage: valid for every purpose.
    Any,
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    /// A purpose without a dedicated variant, kept as its dotted OID.
    Other(String),
}

impl fmt::Display for ExtKeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::ServerAuth => f.write_str("server-auth"),
            Self::ClientAuth => f.write_str("client-auth"),
            Self::CodeSigning => f.write_str("code-signing"),
            Self::EmailProtection => f.write_str("email-protection"),
            Self::TimeStamping => f.write_str("time-stamping"),
            Self::OcspSigning => f.write_str("ocsp-signing"),
            Self::Other(oid) => f.write_str(oid),
        }
    }
}

/// The certificate fields the label set is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    pub serial_number: SerialNumber,
    pub common_name: String,
    pub dns_names: Vec<String>,
    pub is_ca: bool,
    pub ext_key_usages: Vec<ExtKeyUsage>,
    pub not_after: SystemTime,
}

impl CertificateRecord {
    /// Creates a record with an empty subject, no DNS names and no key usages.
    pub fn new(serial_number: SerialNumber, not_after: SystemTime) -> Self {
        CertificateRecord {
            serial_number,
            common_name: String::new(),
            dns_names: Vec::new(),
            is_ca: false,
            ext_key_usages: Vec::new(),
            not_after,
        }
    }

    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    pub fn with_dns_names(mut self, dns_names: Vec<String>) -> Self {
        self.dns_names = dns_names;
        self
    }

    pub fn with_ca(mut self, is_ca: bool) -> Self {
        self.is_ca = is_ca;
        self
    }

    pub fn with_ext_key_usages(mut self, usages: Vec<ExtKeyUsage>) -> Self {
        self.ext_key_usages = usages;
        self
    }

    pub fn with_not_after(mut self, not_after: SystemTime) -> Self {
        self.not_after = not_after;
        self
    }

    /// Expiration as whole Unix seconds, rounded towards negative infinity.
    pub fn expiration_timestamp(&self) -> i64 {
        unix_seconds(self.not_after)
    }
}

/// Floors a point in time to whole seconds relative to the Unix epoch.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            if before.subsec_nanos() > 0 {
                secs.saturating_neg().saturating_sub(1)
            } else {
                secs.saturating_neg()
            }
        }
    }
}

/// Inverse of [`unix_seconds`] for whole seconds.
pub fn from_unix_seconds(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs.unsigned_abs())
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

/// Records the expiration of every certificate into `sink`.
///
/// Each certificate is handled independently: its [`LabelTuple`] is derived and
/// the expiration timestamp replaces whatever value the series held before.
/// An empty input never touches the sink.
pub fn observe<'a, S, I>(sink: &S, certs: I)
where
    S: ExpirationSink + ?Sized,
    I: IntoIterator<Item = &'a CertificateRecord>,
{
    for cert in certs {
        let labels = LabelTuple::from_certificate(cert);
        sink.set_value(&labels, cert.expiration_timestamp() as f64);
    }
}

/// Same as [`observe`], writing to the gauge registered in the default
/// prometheus registry.
pub fn observe_default<'a, I>(certs: I)
where
    I: IntoIterator<Item = &'a CertificateRecord>,
{
    observe(PrometheusSink::default_registry(), certs)
}

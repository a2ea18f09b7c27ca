//! Label derivation for the expiration gauge.
//!
//! Every certificate maps to exactly one [`LabelTuple`]. The mapping is a pure
//! function of the certificate's fields, so observing the same certificate twice
//! always lands on the same series.

use serde::Serialize;

use crate::{CertificateRecord, ExtKeyUsage};

/// Label names of the expiration gauge, in declaration order.
pub const LABEL_NAMES: [&str; 6] = ["serial_no", "cn", "hostnames", "ca", "server", "client"];

/// The six label values identifying one expiration series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LabelTuple {
    pub serial_no: String,
    pub cn: String,
    pub hostnames: String,
    pub ca: String,
    pub server: String,
    pub client: String,
}

impl LabelTuple {
    pub fn from_certificate(cert: &CertificateRecord) -> Self {
        LabelTuple {
            serial_no: cert.serial_number.to_string(),
            cn: cert.common_name.clone(),
            hostnames: canonical_hostnames(&cert.dns_names),
            ca: binary_flag(cert.is_ca).to_string(),
            server: usage_flag(&cert.ext_key_usages, &ExtKeyUsage::ServerAuth).to_string(),
            client: usage_flag(&cert.ext_key_usages, &ExtKeyUsage::ClientAuth).to_string(),
        }
    }

    /// Label values in [`LABEL_NAMES`] order.
    pub fn values(&self) -> [&str; 6] {
        [
            self.serial_no.as_str(),
            self.cn.as_str(),
            self.hostnames.as_str(),
            self.ca.as_str(),
            self.server.as_str(),
            self.client.as_str(),
        ]
    }

    /// `(name, value)` pairs in [`LABEL_NAMES`] order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        LABEL_NAMES.iter().copied().zip(self.values())
    }
}

/// Sorts a copy of `dns_names` by byte order and joins it with commas.
///
/// Duplicates are kept; an empty list yields an empty string.
pub fn canonical_hostnames(dns_names: &[String]) -> String {
    let mut sorted: Vec<&str> = dns_names.iter().map(String::as_str).collect();
    sorted.sort();
    sorted.join(",")
}

/// `"1"` when `usages` contains `target` or the any-purpose usage.
pub fn usage_flag(usages: &[ExtKeyUsage], target: &ExtKeyUsage) -> &'static str {
    let present = usages
        .iter()
        .any(|usage| usage == target || *usage == ExtKeyUsage::Any);
    binary_flag(present)
}

pub fn binary_flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

//! Building [`CertificateRecord`]s from X.509 certificates.
//!
//! OpenSSL decodes the certificate and supplies the subject, serial, SAN and
//! validity fields. Extended key usage and basic constraints come from
//! `x509-parser`, since OpenSSL has no safe accessor for them.

use std::fs;
use std::path::Path;

use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::{X509Ref, X509};
use tracing::{debug, warn};
use x509_parser::certificate::X509Certificate;

use crate::error::{CertMetricsError, Result};
use crate::{from_unix_seconds, CertificateRecord, ExtKeyUsage, SerialNumber};

const SECONDS_PER_DAY: i64 = 86_400;

/// Every certificate of a PEM bundle, in bundle order.
pub fn records_from_pem(pem: &[u8]) -> Result<Vec<CertificateRecord>> {
    let certs = X509::stack_from_pem(pem)?;
    if certs.is_empty() {
        return Err(CertMetricsError::NoCertificates {
            origin: "input".to_string(),
        });
    }
    certs.iter().map(|cert| record_from_x509(cert)).collect()
}

/// A single DER-encoded certificate.
pub fn record_from_der(der: &[u8]) -> Result<CertificateRecord> {
    let cert = X509::from_der(der)?;
    record_from_x509(&cert)
}

/// Loads a certificate file, PEM bundle or single DER certificate.
pub fn records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CertificateRecord>> {
    let path = path.as_ref();
    let content = fs::read(path)?;
    debug!(path = %path.display(), bytes = content.len(), "loaded certificate file");

    if looks_like_pem(&content) {
        records_from_pem(&content).map_err(|e| match e {
            CertMetricsError::NoCertificates { .. } => CertMetricsError::NoCertificates {
                origin: path.display().to_string(),
            },
            other => other,
        })
    } else {
        Ok(vec![record_from_der(&content)?])
    }
}

pub fn record_from_x509(cert: &X509Ref) -> Result<CertificateRecord> {
    let serial = cert.serial_number().to_bn()?;
    let serial_number = SerialNumber::from_bn(&serial)?;
    let not_after = from_unix_seconds(asn1_unix_seconds(cert.not_after())?);

    let common_name = match cert.subject_name().entries_by_nid(Nid::COMMONNAME).last() {
        Some(entry) => entry.data().to_string()?,
        None => String::new(),
    };

    let dns_names = cert
        .subject_alt_names()
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.dnsname().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let der = cert.to_der()?;
    let (_, parsed) =
        x509_parser::parse_x509_certificate(&der).map_err(|e| CertMetricsError::CertificateError {
            reason: e.to_string(),
        })?;

    Ok(CertificateRecord {
        serial_number,
        common_name,
        dns_names,
        is_ca: is_ca(&parsed)?,
        ext_key_usages: ext_key_usages(&parsed)?,
        not_after,
    })
}

fn looks_like_pem(content: &[u8]) -> bool {
    let start = content
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(content.len());
    content[start..].starts_with(b"-----BEGIN")
}

fn asn1_unix_seconds(time: &Asn1TimeRef) -> Result<i64> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    Ok(i64::from(diff.days) * SECONDS_PER_DAY + i64::from(diff.secs))
}

fn is_ca(cert: &X509Certificate<'_>) -> Result<bool> {
    Ok(cert
        .basic_constraints()?
        .map(|ext| ext.value.ca)
        .unwrap_or(false))
}

fn ext_key_usages(cert: &X509Certificate<'_>) -> Result<Vec<ExtKeyUsage>> {
    let eku = match cert.extended_key_usage()? {
        Some(ext) => ext.value,
        None => return Ok(Vec::new()),
    };

    let known = [
        (eku.any, ExtKeyUsage::Any),
        (eku.server_auth, ExtKeyUsage::ServerAuth),
        (eku.client_auth, ExtKeyUsage::ClientAuth),
        (eku.code_signing, ExtKeyUsage::CodeSigning),
        (eku.email_protection, ExtKeyUsage::EmailProtection),
        (eku.time_stamping, ExtKeyUsage::TimeStamping),
        (eku.ocsp_signing, ExtKeyUsage::OcspSigning),
    ];
    let mut usages: Vec<ExtKeyUsage> = known
        .into_iter()
        .filter_map(|(present, usage)| if present { Some(usage) } else { None })
        .collect();

    for oid in &eku.other {
        warn!(oid = %oid, "unrecognized extended key usage");
        usages.push(ExtKeyUsage::Other(oid.to_string()));
    }
    Ok(usages)
}

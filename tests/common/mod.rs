#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use certmetrics::{ExpirationSink, LabelTuple};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::extension::{BasicConstraints, ExtendedKeyUsage, SubjectAlternativeName};
use openssl::x509::{X509Builder, X509NameBuilder, X509};

/// 2030-01-01T00:00:00Z
pub const JAN_2030: i64 = 1_893_456_000;

/// Sink that remembers the last value per label set and counts writes.
#[derive(Default)]
pub struct RecordingSink {
    series: Mutex<HashMap<LabelTuple, f64>>,
    writes: AtomicUsize,
}

impl RecordingSink {
    pub fn get(&self, labels: &LabelTuple) -> Option<f64> {
        self.series.lock().unwrap().get(labels).copied()
    }

    pub fn len(&self) -> usize {
        self.series.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ExpirationSink for RecordingSink {
    fn set_value(&self, labels: &LabelTuple, value: f64) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.series.lock().unwrap().insert(labels.clone(), value);
    }
}

/// Fields of a self-signed test certificate.
pub struct CertSpec<'a> {
    pub serial: &'a str,
    pub common_names: Vec<&'a str>,
    pub dns_names: Vec<&'a str>,
    pub ca: bool,
    /// OpenSSL extended key usage names or dotted OIDs
    pub usages: Vec<&'a str>,
    pub not_after: i64,
}

impl<'a> Default for CertSpec<'a> {
    fn default() -> Self {
        CertSpec {
            serial: "1",
            common_names: Vec::new(),
            dns_names: Vec::new(),
            ca: false,
            usages: Vec::new(),
            not_after: JAN_2030,
        }
    }
}

pub fn mint(spec: &CertSpec<'_>) -> X509 {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_dec_str(spec.serial)
        .unwrap()
        .to_asn1_integer()
        .unwrap();
    builder.set_serial_number(&serial).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    for cn in &spec.common_names {
        name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    }
    let name = name.build();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::from_unix(1_700_000_000).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::from_unix(spec.not_after).unwrap())
        .unwrap();

    if !spec.dns_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in &spec.dns_names {
            san.dns(dns);
        }
        let extension = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(extension).unwrap();
    }
    if spec.ca {
        let extension = BasicConstraints::new().critical().ca().build().unwrap();
        builder.append_extension(extension).unwrap();
    }
    if !spec.usages.is_empty() {
        let mut eku = ExtendedKeyUsage::new();
        for usage in &spec.usages {
            eku.other(usage);
        }
        builder.append_extension(eku.build().unwrap()).unwrap();
    }

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build()
}

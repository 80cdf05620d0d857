// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Object parsers.
//!
//! The engine consumes structured [`Record`]s through the [`ObjectParser`]
//! trait. [`X509Parser`] decodes resource certificates and CRLs from DER
//! with the `x509-cert` crate; CMS-wrapped objects are left to other
//! parser implementations.
//!
//! # Example
//!
//! ```no_run
//! use rpki_validator::parser::{ObjectParser, X509Parser};
//! use rpki_validator::types::{ObjectKind, Record};
//!
//! # fn example(der: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let parser = X509Parser::new();
//! if let Record::Certificate(cert) = parser.parse(ObjectKind::Certificate, "ca.cer", der)? {
//!     println!("SKI {} valid until {:?}", cert.ski, cert.not_after);
//! }
//! # Ok(())
//! # }
//! ```

mod rfc3779;

use crate::error::{Result, RpkiError};
use crate::resources::ResourceSet;
use crate::types::{
    CertPurpose, CrlRecord, Extension, KeyId, ObjectKind, Record, ResourceCert, Serial,
    SignedData,
};
use crate::validation::{ID_PE_AUTONOMOUS_SYS_IDS, ID_PE_IP_ADDR_BLOCKS};
use const_oid::{AssociatedOid, ObjectIdentifier};
use der::{Decode, Encode};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use x509_cert::crl::CertificateList;
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{
    AccessDescription, AuthorityInfoAccessSyntax, AuthorityKeyIdentifier, BasicConstraints,
    CrlDistributionPoints, ExtendedKeyUsage, SubjectInfoAccessSyntax, SubjectKeyIdentifier,
};
use x509_cert::time::Time;
use x509_cert::Certificate;

/// id-ad-caIssuers.
const ID_AD_CA_ISSUERS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.2");

/// id-ad-rpkiManifest.
const ID_AD_RPKI_MANIFEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.10");

/// id-kp-bgpsec-router.
const ID_KP_BGPSEC_ROUTER: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.30");

/// Turns raw object bytes into records.
pub trait ObjectParser: Send + Sync {
    /// Parse `data`, found at `location`, as an object of `kind`.
    fn parse(&self, kind: ObjectKind, location: &str, data: &[u8]) -> Result<Record>;
}

/// DER parser for resource certificates and CRLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct X509Parser;

fn to_system_time(time: &Time) -> SystemTime {
    let since_epoch = match time {
        Time::UtcTime(utc) => utc.to_unix_duration(),
        Time::GeneralTime(general) => general.to_unix_duration(),
    };
    UNIX_EPOCH + since_epoch
}

/// Pick the `rsync://` URI from a list of general names, falling back to
/// the first URI of any scheme.
fn pick_uri<'a>(names: impl Iterator<Item = &'a GeneralName>) -> Option<String> {
    let uris: Vec<String> = names
        .filter_map(|name| match name {
            GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
            _ => None,
        })
        .collect();
    uris.iter()
        .find(|u| u.starts_with("rsync://"))
        .or_else(|| uris.first())
        .cloned()
}

fn access_uri(descriptions: &[AccessDescription], method: ObjectIdentifier) -> Option<String> {
    pick_uri(
        descriptions
            .iter()
            .filter(|d| d.access_method == method)
            .map(|d| &d.access_location),
    )
}

fn crl_uri(points: &[DistributionPoint]) -> Option<String> {
    pick_uri(
        points
            .iter()
            .filter_map(|dp| match &dp.distribution_point {
                Some(DistributionPointName::FullName(names)) => Some(names),
                _ => None,
            })
            .flatten(),
    )
}

impl X509Parser {
    /// Create a parser.
    pub fn new() -> Self {
        Self
    }

    fn decode_ext<T: for<'a> Decode<'a>>(location: &str, name: &str, value: &[u8]) -> Result<T> {
        T::from_der(value).map_err(|e| RpkiError::parse(location, format!("{name}: {e}")))
    }

    /// Parse a DER resource certificate.
    pub fn parse_certificate(&self, location: &str, data: &[u8]) -> Result<ResourceCert> {
        let cert = Certificate::from_der(data)
            .map_err(|e| RpkiError::parse(location, format!("certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;

        let mut ski = None;
        let mut aki = None;
        let mut aia = None;
        let mut crl = None;
        let mut mft = None;
        let mut ca = false;
        let mut path_len = None;
        let mut router = false;
        let mut extensions = Vec::new();
        let mut resources = ResourceSet::default();

        for ext in tbs.extensions.iter().flatten() {
            extensions.push(Extension {
                oid: ext.extn_id,
                critical: ext.critical,
            });
            let value = ext.extn_value.as_bytes();

            match ext.extn_id {
                id if id == SubjectKeyIdentifier::OID => {
                    let parsed: SubjectKeyIdentifier = Self::decode_ext(location, "SKI", value)?;
                    ski = Some(KeyId::new(parsed.0.as_bytes()));
                }
                id if id == AuthorityKeyIdentifier::OID => {
                    let parsed: AuthorityKeyIdentifier = Self::decode_ext(location, "AKI", value)?;
                    aki = parsed.key_identifier.map(|k| KeyId::new(k.as_bytes()));
                }
                id if id == BasicConstraints::OID => {
                    let parsed: BasicConstraints =
                        Self::decode_ext(location, "basic constraints", value)?;
                    ca = parsed.ca;
                    path_len = parsed.path_len_constraint;
                }
                id if id == AuthorityInfoAccessSyntax::OID => {
                    let parsed: AuthorityInfoAccessSyntax =
                        Self::decode_ext(location, "AIA", value)?;
                    aia = access_uri(&parsed.0, ID_AD_CA_ISSUERS);
                }
                id if id == SubjectInfoAccessSyntax::OID => {
                    let parsed: SubjectInfoAccessSyntax =
                        Self::decode_ext(location, "SIA", value)?;
                    mft = access_uri(&parsed.0, ID_AD_RPKI_MANIFEST);
                }
                id if id == CrlDistributionPoints::OID => {
                    let parsed: CrlDistributionPoints =
                        Self::decode_ext(location, "CRL distribution points", value)?;
                    crl = crl_uri(&parsed.0);
                }
                id if id == ExtendedKeyUsage::OID => {
                    let parsed: ExtendedKeyUsage = Self::decode_ext(location, "EKU", value)?;
                    router = parsed.0.contains(&ID_KP_BGPSEC_ROUTER);
                }
                id if id == ID_PE_IP_ADDR_BLOCKS => {
                    rfc3779::decode_ip_blocks(value, &mut resources)
                        .map_err(|e| RpkiError::parse(location, format!("IP resources: {e}")))?;
                }
                id if id == ID_PE_AUTONOMOUS_SYS_IDS => {
                    rfc3779::decode_as_ids(value, &mut resources)
                        .map_err(|e| RpkiError::parse(location, format!("AS resources: {e}")))?;
                }
                _ => {}
            }
        }

        let ski = ski.ok_or_else(|| RpkiError::parse(location, "missing SKI"))?;
        let self_issued = aki.as_ref().map_or(true, |a| *a == ski);
        let purpose = match (ca, self_issued, router) {
            (true, true, _) => CertPurpose::TrustAnchor,
            (true, false, _) => CertPurpose::Ca,
            (false, _, true) => CertPurpose::BgpsecRouter,
            (false, _, false) => CertPurpose::Ee,
        };

        let parsed = ResourceCert {
            serial: Serial::new(tbs.serial_number.as_bytes()),
            subject: tbs.subject.to_string(),
            issuer: tbs.issuer.to_string(),
            ski,
            aki,
            aia,
            crl_uri: crl,
            mft_uri: mft,
            not_before: to_system_time(&tbs.validity.not_before),
            not_after: to_system_time(&tbs.validity.not_after),
            purpose,
            ca,
            path_len,
            extensions,
            resources,
            spki: tbs.subject_public_key_info.to_der()?,
            signed: SignedData {
                message: tbs.to_der()?,
                algorithm: Some(cert.signature_algorithm.oid),
                signature: cert.signature.raw_bytes().to_vec(),
            },
        };
        debug!("Parsed {} certificate {} ({})", parsed.purpose, parsed.ski, location);
        Ok(parsed)
    }

    /// Parse a DER certificate revocation list.
    pub fn parse_crl(&self, location: &str, data: &[u8]) -> Result<CrlRecord> {
        let crl = CertificateList::from_der(data)
            .map_err(|e| RpkiError::parse(location, format!("CRL: {e}")))?;
        let tbs = &crl.tbs_cert_list;

        let mut aki = None;
        for ext in tbs.crl_extensions.iter().flatten() {
            if ext.extn_id == AuthorityKeyIdentifier::OID {
                let parsed: AuthorityKeyIdentifier =
                    Self::decode_ext(location, "AKI", ext.extn_value.as_bytes())?;
                aki = parsed.key_identifier.map(|k| KeyId::new(k.as_bytes()));
            }
        }

        let aki = aki.ok_or_else(|| RpkiError::parse(location, "CRL without AKI"))?;
        let next_update = tbs
            .next_update
            .as_ref()
            .ok_or_else(|| RpkiError::parse(location, "CRL without nextUpdate"))?;

        let revoked = tbs
            .revoked_certificates
            .iter()
            .flatten()
            .map(|entry| Serial::new(entry.serial_number.as_bytes()))
            .collect();

        Ok(CrlRecord {
            aki,
            this_update: to_system_time(&tbs.this_update),
            next_update: to_system_time(next_update),
            revoked,
            signed: SignedData {
                message: tbs.to_der()?,
                algorithm: Some(crl.signature_algorithm.oid),
                signature: crl.signature.raw_bytes().to_vec(),
            },
        })
    }
}

impl ObjectParser for X509Parser {
    fn parse(&self, kind: ObjectKind, location: &str, data: &[u8]) -> Result<Record> {
        match kind {
            ObjectKind::Certificate => self.parse_certificate(location, data).map(Record::Certificate),
            ObjectKind::Crl => self.parse_crl(location, data).map(Record::Crl),
            other => Err(RpkiError::unsupported(format!(
                "{location}: {other} objects are not handled by the X.509 parser"
            ))),
        }
    }
}

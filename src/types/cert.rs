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

//! Resource certificate records.

use super::{KeyId, Serial};
use crate::resources::ResourceSet;
use const_oid::ObjectIdentifier;
use serde::Serialize;
use std::fmt;
use std::time::SystemTime;

/// What a resource certificate is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CertPurpose {
    /// Self-signed trust anchor.
    TrustAnchor,
    /// Subordinate certification authority.
    Ca,
    /// End-entity certificate inside a signed object.
    Ee,
    /// BGPsec router certificate.
    BgpsecRouter,
}

impl CertPurpose {
    /// Whether the certificate may issue other certificates.
    pub fn is_authority(&self) -> bool {
        matches!(self, Self::TrustAnchor | Self::Ca)
    }
}

impl fmt::Display for CertPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TrustAnchor => "TA",
            Self::Ca => "CA",
            Self::Ee => "EE",
            Self::BgpsecRouter => "BGPsec router",
        };
        f.write_str(s)
    }
}

/// An extension present in a certificate, reduced to what path validation
/// needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    /// Extension OID.
    pub oid: ObjectIdentifier,
    /// Whether the extension is marked critical.
    pub critical: bool,
}

/// The signed portion of a certificate or CRL together with its signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedData {
    /// DER encoding of the to-be-signed structure.
    pub message: Vec<u8>,
    /// Signature algorithm OID.
    pub algorithm: Option<ObjectIdentifier>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

/// A parsed resource certificate.
#[derive(Clone, Debug)]
pub struct ResourceCert {
    /// Serial number.
    pub serial: Serial,
    /// Subject name, rendered for logs.
    pub subject: String,
    /// Issuer name, rendered for logs.
    pub issuer: String,
    /// Subject key identifier.
    pub ski: KeyId,
    /// Authority key identifier; absent on trust anchors.
    pub aki: Option<KeyId>,
    /// Authority information access URI of the issuer certificate.
    pub aia: Option<String>,
    /// CRL distribution point URI.
    pub crl_uri: Option<String>,
    /// Manifest URI from the subject information access extension.
    pub mft_uri: Option<String>,
    /// Start of the validity window.
    pub not_before: SystemTime,
    /// End of the validity window.
    pub not_after: SystemTime,
    /// Certificate purpose.
    pub purpose: CertPurpose,
    /// Basic constraints cA flag.
    pub ca: bool,
    /// Basic constraints path length constraint.
    pub path_len: Option<u8>,
    /// Extensions present, with criticality.
    pub extensions: Vec<Extension>,
    /// IP and AS resources claimed by the certificate.
    pub resources: ResourceSet,
    /// DER encoded SubjectPublicKeyInfo.
    pub spki: Vec<u8>,
    /// Signed portion used for signature verification.
    pub signed: SignedData,
}

impl ResourceCert {
    /// Whether the certificate is self-issued (AKI absent or equal to SKI).
    pub fn is_self_issued(&self) -> bool {
        match &self.aki {
            None => true,
            Some(aki) => *aki == self.ski,
        }
    }

    /// Whether `now` falls inside the validity window.
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Critical extensions present on the certificate.
    pub fn critical_extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter().filter(|ext| ext.critical)
    }
}

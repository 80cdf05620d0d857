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

//! Records handed to the engine by object parsers.
//!
//! Parsers turn raw repository objects into these structured records. The
//! engine never looks at DER itself: everything it needs for chain building
//! and validation is carried here.

mod cert;
mod crl;
mod manifest;
mod signed;

pub use cert::{CertPurpose, Extension, ResourceCert, SignedData};
pub use crl::CrlRecord;
pub use manifest::{FileAndHash, Manifest};
pub use signed::SignedObject;

use crate::error::{Result, RpkiError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A subject or authority key identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(Vec<u8>);

impl KeyId {
    /// Wrap raw key identifier bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self)
    }
}

/// A certificate serial number, normalized without leading zero bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serial(Vec<u8>);

impl Serial {
    /// Build a serial from its big-endian DER integer content.
    pub fn new(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self(bytes[start..].to_vec())
    }

    /// The normalized serial bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<u64> for Serial {
    fn from(value: u64) -> Self {
        Self::new(&value.to_be_bytes())
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("00")
        } else {
            f.write_str(&hex::encode_upper(&self.0))
        }
    }
}

/// The kinds of repository objects the engine knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Resource certificate (`.cer`): trust anchor, CA or router.
    Certificate,
    /// Certificate revocation list (`.crl`).
    Crl,
    /// Manifest (`.mft`).
    Manifest,
    /// Route origin authorization (`.roa`).
    Roa,
    /// Autonomous system provider authorization (`.asa`).
    Aspa,
    /// Ghostbusters record (`.gbr`).
    Gbr,
    /// Resource signed checklist (`.sig`).
    Rsc,
    /// Signed prefix list (`.spl`).
    Spl,
    /// Trust anchor key (`.tak`).
    Tak,
    /// Signed geofeed (`.csv`).
    Geofeed,
    /// Trust anchor locator (`.tal`).
    Tal,
}

impl ObjectKind {
    /// Determine the object kind from a file name or URI extension.
    pub fn from_path(path: &str) -> Result<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| RpkiError::unsupported(format!("{path}: no file extension")))?;

        Self::from_extension(&ext)
            .ok_or_else(|| RpkiError::unsupported(format!("{path}: unsupported file type")))
    }

    /// Map a lowercase file extension to an object kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let kind = match ext {
            "cer" => Self::Certificate,
            "crl" => Self::Crl,
            "mft" => Self::Manifest,
            "roa" => Self::Roa,
            "asa" => Self::Aspa,
            "gbr" => Self::Gbr,
            "sig" => Self::Rsc,
            "spl" => Self::Spl,
            "tak" => Self::Tak,
            "csv" => Self::Geofeed,
            "tal" => Self::Tal,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this kind is a CMS signed object carried by an EE certificate
    /// other than a manifest.
    pub fn is_signed_object(&self) -> bool {
        matches!(
            self,
            Self::Roa | Self::Aspa | Self::Gbr | Self::Rsc | Self::Spl | Self::Tak | Self::Geofeed
        )
    }

    /// Short name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Crl => "crl",
            Self::Manifest => "manifest",
            Self::Roa => "roa",
            Self::Aspa => "aspa",
            Self::Gbr => "gbr",
            Self::Rsc => "rsc",
            Self::Spl => "spl",
            Self::Tak => "tak",
            Self::Geofeed => "geofeed",
            Self::Tal => "tal",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw object submitted for validation.
#[derive(Clone, Debug)]
pub struct Object {
    /// Where the object was found (URI or path).
    pub location: String,
    /// What kind of object it is.
    pub kind: ObjectKind,
    /// The raw object bytes.
    pub data: Vec<u8>,
}

impl Object {
    /// Create an object, deriving its kind from the location's extension.
    pub fn new(location: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self> {
        let location = location.into();
        let kind = ObjectKind::from_path(&location)?;
        Ok(Self {
            location,
            kind,
            data: data.into(),
        })
    }

    /// Create an object of an explicit kind.
    pub fn with_kind(
        kind: ObjectKind,
        location: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            location: location.into(),
            kind,
            data: data.into(),
        }
    }

    /// The directory part of the location, used to resolve manifest entries.
    pub fn directory(&self) -> &str {
        match self.location.rfind('/') {
            Some(pos) => &self.location[..pos],
            None => "",
        }
    }
}

/// A parsed object.
#[derive(Clone, Debug)]
pub enum Record {
    /// A resource certificate.
    Certificate(ResourceCert),
    /// A certificate revocation list.
    Crl(CrlRecord),
    /// A manifest.
    Manifest(Manifest),
    /// Any other signed object.
    Signed(SignedObject),
}

impl Record {
    /// The object kind this record represents.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Certificate(_) => ObjectKind::Certificate,
            Self::Crl(_) => ObjectKind::Crl,
            Self::Manifest(_) => ObjectKind::Manifest,
            Self::Signed(obj) => obj.kind,
        }
    }
}

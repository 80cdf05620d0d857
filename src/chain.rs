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

//! Authority chain collection.
//!
//! Issuer references point from leaf to root (AIA), while path validation
//! runs from root to leaf. [`ChainBuilder::collect`] walks AIA pointers
//! upward, loading unknown issuers onto a bounded pending stack until it
//! reaches a certificate already in the [`AuthStore`]. The engine then
//! replays the stack root-first, validating and inserting each entry, and
//! discards everything if any step fails.

use crate::auth::{AuthStore, NodeId};
use crate::crl_store::CrlStore;
use crate::error::{Result, RpkiError};
use crate::parser::ObjectParser;
use crate::repository::Repository;
use crate::types::{CertPurpose, CrlRecord, KeyId, ObjectKind, Record, ResourceCert};
use tracing::{debug, warn};

/// Maximum number of unvalidated issuers loaded for one object.
pub const MAX_DEPTH: usize = 12;

/// An issuer certificate loaded during the walk but not yet validated.
#[derive(Debug, Clone)]
pub struct PendingCert {
    /// The parsed certificate.
    pub cert: ResourceCert,
    /// Where it was loaded from.
    pub location: String,
}

/// Result of a successful walk.
#[derive(Debug)]
pub struct PendingChain {
    /// The already validated certificate the walk ended at.
    pub join: NodeId,
    /// Loaded issuers, nearest first. Replay runs in reverse.
    pub entries: Vec<PendingCert>,
    /// CRLs loaded for the pending entries, committed with them.
    pub crls: Vec<CrlRecord>,
}

impl PendingChain {
    /// Whether the issuer was already validated.
    pub fn is_resolved(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks AIA references to the nearest validated issuer.
pub struct ChainBuilder<'a> {
    repository: &'a dyn Repository,
    parser: &'a dyn ObjectParser,
    fetch_crls: bool,
}

impl<'a> ChainBuilder<'a> {
    /// Create a builder loading objects through `repository`.
    pub fn new(
        repository: &'a dyn Repository,
        parser: &'a dyn ObjectParser,
        fetch_crls: bool,
    ) -> Self {
        Self {
            repository,
            parser,
            fetch_crls,
        }
    }

    /// Load the CRL at `uri` if it belongs to `issuer`.
    ///
    /// A CRL that cannot be loaded or names another issuer is skipped; the
    /// missing-CRL policy decides what that means for validation.
    pub fn fetch_crl(&self, uri: &str, issuer: &KeyId) -> Option<CrlRecord> {
        let data = match self.repository.load(uri) {
            Ok(data) => data,
            Err(e) => {
                debug!("CRL {} not loaded: {}", uri, e);
                return None;
            }
        };
        match self.parser.parse(ObjectKind::Crl, uri, &data) {
            Ok(Record::Crl(crl)) if crl.aki == *issuer => Some(crl),
            Ok(Record::Crl(crl)) => {
                warn!("{}: CRL issued by {}, expected {}", uri, crl.aki, issuer);
                None
            }
            Ok(_) => {
                warn!("{}: not a CRL", uri);
                None
            }
            Err(e) => {
                warn!("{}: {}", uri, e);
                None
            }
        }
    }

    fn load_certificate(&self, uri: &str) -> Result<ResourceCert> {
        let data = self.repository.load(uri)?;
        match self.parser.parse(ObjectKind::Certificate, uri, &data)? {
            Record::Certificate(cert) => Ok(cert),
            other => Err(RpkiError::broken_chain(format!(
                "{uri}: expected a certificate, found {}",
                other.kind()
            ))),
        }
    }

    /// Walk upward from an object with authority key identifier `aki` and
    /// issuer pointer `aia` until a validated issuer is found.
    ///
    /// Fails with `ChainTooLong` once [`MAX_DEPTH`] unvalidated issuers have
    /// been loaded without reaching the Auth Store, which also bounds AIA
    /// cycles. Nothing is inserted into either store.
    pub fn collect(
        &self,
        auths: &AuthStore,
        crls: &CrlStore,
        aki: &KeyId,
        aia: Option<&str>,
    ) -> Result<PendingChain> {
        let mut expected = aki.clone();
        let mut uri = aia.map(str::to_string);
        let mut entries: Vec<PendingCert> = Vec::new();
        let mut staged: Vec<CrlRecord> = Vec::new();

        loop {
            if let Some(join) = auths.find(&expected) {
                debug!(
                    "Chain joins validated issuer {} after {} loads",
                    expected,
                    entries.len()
                );
                return Ok(PendingChain {
                    join,
                    entries,
                    crls: staged,
                });
            }

            if entries.len() >= MAX_DEPTH {
                warn!("Authority chain exceeds {} unvalidated issuers", MAX_DEPTH);
                return Err(RpkiError::ChainTooLong { depth: MAX_DEPTH });
            }

            let target = uri.take().ok_or_else(|| {
                RpkiError::broken_chain(format!("issuer {expected} unknown and no AIA to follow"))
            })?;
            debug!("Loading issuer {} from {}", expected, target);
            let cert = self.load_certificate(&target)?;

            if cert.ski != expected {
                return Err(RpkiError::broken_chain(format!(
                    "{target}: SKI {} does not match expected {}",
                    cert.ski, expected
                )));
            }
            if cert.purpose != CertPurpose::Ca {
                return Err(RpkiError::not_ca(target, cert.purpose));
            }
            let next = cert
                .aki
                .clone()
                .ok_or_else(|| RpkiError::broken_chain(format!("{target}: no AKI")))?;

            if self.fetch_crls && !crls.contains(&next) && !staged.iter().any(|c| c.aki == next) {
                if let Some(crl_uri) = cert.crl_uri.as_deref() {
                    if let Some(crl) = self.fetch_crl(crl_uri, &next) {
                        staged.push(crl);
                    }
                }
            }

            uri = cert.aia.clone();
            expected = next;
            entries.push(PendingCert {
                cert,
                location: target,
            });
        }
    }
}
